use std::collections::BTreeMap;

pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";
pub const VERSION_LABEL: &str = "app.kubernetes.io/version";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const WORKSPACE_LABEL: &str = "aichatworkspace";

pub const MANAGED_BY: &str = "aichat-workspace-operator";

/// Component label values.
pub mod component {
    pub const NAMESPACE: &str = "aichatworkspace";
    pub const RESOURCE_QUOTA: &str = "resourceQuota";
    pub const PVC: &str = "pvc";
    pub const SERVICE_ACCOUNT: &str = "sa";
    pub const SERVICE: &str = "svc";
    pub const MODEL_RUNTIME: &str = "ollama";
    pub const CHAT_UI: &str = "openwebui";
    pub const INGRESS: &str = "ingress";
    pub const AUTOSCALING: &str = "autoscaling";
}

/// Label set carried by every child of workspace `ws`.
pub fn standard_labels(
    ws: &str,
    name: &str,
    component: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (NAME_LABEL.to_string(), name.to_string()),
        (PART_OF_LABEL.to_string(), format!("aichat-workspace-{}", ws)),
        (COMPONENT_LABEL.to_string(), component.to_string()),
        (
            VERSION_LABEL.to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ),
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY.to_string()),
        (WORKSPACE_LABEL.to_string(), ws.to_string()),
    ])
}

/// Pod selector for a workload named `name`.
pub fn selector_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(NAME_LABEL.to_string(), name.to_string())])
}

/// Label selector matching every object this operator manages.
pub fn managed_selector() -> String {
    format!("{}={}", MANAGED_BY_LABEL, MANAGED_BY)
}

pub fn quota_name(ws: &str) -> String {
    format!("{}-rquota", ws)
}

pub fn chat_name(ws: &str) -> String {
    format!("{}-openwebui", ws)
}

pub fn runtime_name(ws: &str) -> String {
    format!("{}-ollama", ws)
}

pub fn interceptor_name(ws: &str) -> String {
    format!("{}-interceptor", ws)
}

pub fn chat_host(ws: &str, domain: &str) -> String {
    format!("{}.{}", ws, domain)
}

pub fn runtime_host(ws: &str, domain: &str) -> String {
    format!("{}-api.{}", ws, domain)
}

/// In-cluster address of the model runtime Service.
pub fn runtime_base_url(ws: &str, cluster_domain: &str, port: i32) -> String {
    format!("http://{}.{}.svc.{}:{}", runtime_name(ws), ws, cluster_domain, port)
}
