#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use aicw_operator::crd::{AIChatWorkspace, AIChatWorkspaceSpec};
use aicw_operator::settings::{
    KEY_DEFAULT_DOMAIN, KEY_OLLAMA_IMAGE_TAG, KEY_OPENWEBUI_IMAGE_TAG,
};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{
    Client,
    api::{Api, DeleteParams, PostParams},
};

// DNS-1123 safe numeric suffix for unique names
pub fn uniq(prefix: &str) -> String {
    let micros = chrono::Utc::now().timestamp_micros() % 1_000_000;
    format!("{prefix}-{micros:06}")
}

// Env guard utilities
pub struct EnvGuard {
    key: &'static str,
    old: Option<String>,
}
impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            if let Some(ref v) = self.old {
                std::env::set_var(self.key, v);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }
}
pub fn set_env(key: &'static str, val: &str) -> EnvGuard {
    let old = std::env::var(key).ok();
    unsafe {
        std::env::set_var(key, val);
    }
    EnvGuard { key, old }
}

pub async fn client() -> Client {
    let _ = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    );
    Client::try_default().await.expect("kube client")
}

pub fn workspace(name: &str, models: &[&str]) -> AIChatWorkspace {
    AIChatWorkspace::new(
        name,
        AIChatWorkspaceSpec {
            workspace_name: name.to_string(),
            workspace_env: "dev".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            prompt_patterns: vec![],
        },
    )
}

/// Creates a namespace holding a settings ConfigMap and returns its name.
pub async fn create_settings(client: Client, cm_name: &str) -> String {
    let ns = uniq("aicw-it-settings");
    let ns_api: Api<Namespace> = Api::all(client.clone());
    ns_api
        .create(
            &PostParams::default(),
            &Namespace {
                metadata: ObjectMeta {
                    name: Some(ns.clone()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .expect("create settings namespace");

    let cm_api: Api<ConfigMap> = Api::namespaced(client, &ns);
    cm_api
        .create(
            &PostParams::default(),
            &ConfigMap {
                metadata: ObjectMeta {
                    name: Some(cm_name.to_string()),
                    ..Default::default()
                },
                data: Some(BTreeMap::from([
                    (KEY_DEFAULT_DOMAIN.to_string(), "aicw.test".to_string()),
                    (KEY_OLLAMA_IMAGE_TAG.to_string(), "0.3.12".to_string()),
                    (KEY_OPENWEBUI_IMAGE_TAG.to_string(), "main".to_string()),
                ])),
                ..Default::default()
            },
        )
        .await
        .expect("create settings configmap");
    ns
}

/// Polls `check` once a second until it holds or `secs` elapse.
pub async fn wait_until<F, Fut>(secs: u64, what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..secs {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("timed out waiting for {what}");
}

pub async fn cleanup(client: Client, ws: &str, settings_ns: &str) {
    let ws_api: Api<AIChatWorkspace> = Api::all(client.clone());
    let _ = ws_api.delete(ws, &DeleteParams::default()).await;
    let ns_api: Api<Namespace> = Api::all(client);
    let _ = ns_api.delete(settings_ns, &DeleteParams::default()).await;
}
