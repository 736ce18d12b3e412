//! Pure constructors for every child kind of a workspace.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, StatefulSet, StatefulSetSpec,
};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, ContainerPort, EnvVar, Namespace,
    PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, PodSecurityContext, PodSpec,
    PodTemplateSpec, ResourceQuota, ResourceQuotaSpec, SeccompProfile,
    SecurityContext, Service, ServiceAccount, ServicePort, ServiceSpec,
    Volume, VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend,
    IngressRule, IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, ObjectMeta,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::DynamicObject;
use serde_json::json;

use super::labels::selector_labels;
use super::resources::http_scaled_object_resource;

pub const OLLAMA_IMAGE: &str = "ollama/ollama";
pub const OLLAMA_PORT: i32 = aicw_ollama::DEFAULT_PORT as i32;
pub const OLLAMA_VOLUME_SIZE: &str = "20Gi";
const OLLAMA_VOLUME: &str = "ollama-volume";
const OLLAMA_DATA_PATH: &str = "/.ollama";

pub const OPENWEBUI_IMAGE: &str = "ghcr.io/open-webui/open-webui";
pub const OPENWEBUI_PORT: i32 = 8080;
pub const OPENWEBUI_VOLUME_SIZE: &str = "2Gi";
const OPENWEBUI_VOLUME: &str = "webui-volume";
const OPENWEBUI_DATA_PATH: &str = "/app/backend/data";

pub const KEDA_INTERCEPTOR_PROXY: &str =
    "keda-add-ons-http-interceptor-proxy.keda";

const NON_ROOT_ID: i64 = 10001;

type Labels = BTreeMap<String, String>;

fn meta(ns: Option<&str>, name: &str, labels: Labels) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: ns.map(str::to_string),
        labels: Some(labels),
        ..Default::default()
    }
}

fn storage_request(size: &str) -> VolumeResourceRequirements {
    VolumeResourceRequirements {
        requests: Some(BTreeMap::from([(
            "storage".to_string(),
            Quantity(size.to_string()),
        )])),
        ..Default::default()
    }
}

fn env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

pub fn namespace(name: &str, labels: Labels) -> Namespace {
    Namespace {
        metadata: meta(None, name, labels),
        ..Default::default()
    }
}

/// Caps pods, claims and services inside a workspace namespace.
pub fn resource_quota(ns: &str, name: &str, labels: Labels) -> ResourceQuota {
    let hard = [("pods", "2"), ("persistentvolumeclaims", "2"), ("services", "5")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
        .collect();
    ResourceQuota {
        metadata: meta(Some(ns), name, labels),
        spec: Some(ResourceQuotaSpec {
            hard: Some(hard),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn persistent_volume_claim(
    ns: &str,
    name: &str,
    size: &str,
    labels: Labels,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: meta(Some(ns), name, labels),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".into()]),
            resources: Some(storage_request(size)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn service_account(ns: &str, name: &str, labels: Labels) -> ServiceAccount {
    ServiceAccount {
        metadata: meta(Some(ns), name, labels),
        ..Default::default()
    }
}

fn restricted_container_context() -> SecurityContext {
    SecurityContext {
        allow_privilege_escalation: Some(false),
        capabilities: Some(Capabilities {
            drop: Some(vec!["ALL".into()]),
            ..Default::default()
        }),
        privileged: Some(false),
        read_only_root_filesystem: Some(true),
        run_as_non_root: Some(true),
        seccomp_profile: Some(SeccompProfile {
            type_: "RuntimeDefault".into(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn non_root_pod_context() -> PodSecurityContext {
    PodSecurityContext {
        fs_group: Some(NON_ROOT_ID),
        run_as_user: Some(NON_ROOT_ID),
        run_as_group: Some(NON_ROOT_ID),
        ..Default::default()
    }
}

/// Single-replica Ollama runtime; its service account and headless
/// service share `name`.
pub fn ollama_stateful_set(
    ns: &str,
    name: &str,
    port: i32,
    image_tag: &str,
    volume_size: &str,
    labels: Labels,
) -> StatefulSet {
    let selector = selector_labels(name);
    StatefulSet {
        metadata: meta(Some(ns), name, labels),
        spec: Some(StatefulSetSpec {
            replicas: Some(1),
            service_name: Some(name.to_string()),
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            volume_claim_templates: Some(vec![PersistentVolumeClaim {
                metadata: ObjectMeta {
                    name: Some(OLLAMA_VOLUME.to_string()),
                    ..Default::default()
                },
                spec: Some(PersistentVolumeClaimSpec {
                    access_modes: Some(vec!["ReadWriteOnce".into()]),
                    resources: Some(storage_request(volume_size)),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    restart_policy: Some("Always".into()),
                    service_account_name: Some(name.to_string()),
                    automount_service_account_token: Some(false),
                    security_context: Some(non_root_pod_context()),
                    containers: vec![Container {
                        name: "ollama".into(),
                        image: Some(format!("{}:{}", OLLAMA_IMAGE, image_tag)),
                        env: Some(vec![env("OLLAMA_DEBUG", "1")]),
                        security_context: Some(restricted_container_context()),
                        ports: Some(vec![ContainerPort {
                            container_port: port,
                            ..Default::default()
                        }]),
                        tty: Some(true),
                        volume_mounts: Some(vec![VolumeMount {
                            name: OLLAMA_VOLUME.into(),
                            mount_path: OLLAMA_DATA_PATH.into(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Environment of the chat front-end container.
#[derive(Clone, Debug)]
pub struct ChatEnv<'a> {
    pub workspace: &'a str,
    pub workspace_env: &'a str,
    pub runtime_url: &'a str,
}

/// Open WebUI front-end. Its claim and service account share `name`.
pub fn openwebui_deployment(
    ns: &str,
    name: &str,
    port: i32,
    image_tag: &str,
    chat: &ChatEnv<'_>,
    labels: Labels,
) -> Deployment {
    let selector = selector_labels(name);
    Deployment {
        metadata: meta(Some(ns), name, labels),
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    restart_policy: Some("Always".into()),
                    service_account_name: Some(name.to_string()),
                    automount_service_account_token: Some(false),
                    containers: vec![Container {
                        name: "open-webui".into(),
                        image: Some(format!("{}:{}", OPENWEBUI_IMAGE, image_tag)),
                        env: Some(vec![
                            env("OLLAMA_BASE_URL", chat.runtime_url),
                            env(
                                "OPENAI_API_BASE_URL",
                                format!("{}/v1", chat.runtime_url),
                            ),
                            env("ENV", chat.workspace_env),
                            env(
                                "WEBUI_NAME",
                                format!("AIChat Workspace: {}", chat.workspace),
                            ),
                            env("KEY_FILE", "/tmp/.webui_secret_key"),
                        ]),
                        ports: Some(vec![ContainerPort {
                            container_port: port,
                            ..Default::default()
                        }]),
                        tty: Some(true),
                        volume_mounts: Some(vec![VolumeMount {
                            name: OPENWEBUI_VOLUME.into(),
                            mount_path: OPENWEBUI_DATA_PATH.into(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: OPENWEBUI_VOLUME.into(),
                        persistent_volume_claim: Some(
                            PersistentVolumeClaimVolumeSource {
                                claim_name: name.to_string(),
                                read_only: Some(false),
                            },
                        ),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// ClusterIP service selecting pods labelled with `name`.
pub fn cluster_ip_service(
    ns: &str,
    name: &str,
    port: i32,
    labels: Labels,
) -> Service {
    Service {
        metadata: meta(Some(ns), name, labels),
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".into()),
            selector: Some(selector_labels(name)),
            ports: Some(vec![ServicePort {
                protocol: Some("TCP".into()),
                port,
                target_port: Some(IntOrString::Int(port)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn external_name_service(
    ns: &str,
    name: &str,
    external_name: &str,
    labels: Labels,
) -> Service {
    Service {
        metadata: meta(Some(ns), name, labels),
        spec: Some(ServiceSpec {
            type_: Some("ExternalName".into()),
            external_name: Some(external_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Routes `host` on path prefix `/` to `backend:port`.
pub fn ingress(
    ns: &str,
    name: &str,
    host: &str,
    backend: &str,
    port: i32,
    labels: Labels,
) -> Ingress {
    Ingress {
        metadata: meta(Some(ns), name, labels),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.to_string()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".into()),
                        path_type: "Prefix".into(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: backend.to_string(),
                                port: Some(ServiceBackendPort {
                                    number: Some(port),
                                    ..Default::default()
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// KEDA HTTP add-on object scaling deployment `name` between 0 and 1.
pub fn http_scaled_object(
    ns: &str,
    name: &str,
    port: i32,
    hosts: &[String],
    labels: Labels,
) -> DynamicObject {
    let mut obj = DynamicObject::new(name, &http_scaled_object_resource())
        .within(ns)
        .data(json!({
            "spec": {
                "hosts": hosts,
                "pathPrefixes": ["/"],
                "scaleTargetRef": {
                    "name": name,
                    "kind": "Deployment",
                    "apiVersion": "apps/v1",
                    "service": name,
                    "port": port,
                },
                "replicas": {"min": 0, "max": 1},
                "scalingMetric": {"requestRate": {"targetValue": 20}},
            }
        }));
    obj.metadata.labels = Some(labels);
    obj
}
