//! Operator-wide settings read from a cluster ConfigMap.

use k8s_openapi::api::core::v1::ConfigMap;

pub const KEY_DEFAULT_DOMAIN: &str = "defaultDomain";
pub const KEY_OLLAMA_IMAGE_TAG: &str = "ollamaImageTag";
pub const KEY_OPENWEBUI_IMAGE_TAG: &str = "openwebUIImageTag";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("settings ConfigMap {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },
    #[error("settings key {0} missing")]
    MissingKey(&'static str),
    #[error("settings key {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceSettings {
    pub default_domain: String,
    pub ollama_image_tag: String,
    pub openwebui_image_tag: String,
}

impl WorkspaceSettings {
    pub fn from_config_map(cm: &ConfigMap) -> Result<Self, SettingsError> {
        Ok(Self {
            default_domain: lookup(cm, KEY_DEFAULT_DOMAIN)?,
            ollama_image_tag: lookup(cm, KEY_OLLAMA_IMAGE_TAG)?,
            openwebui_image_tag: lookup(cm, KEY_OPENWEBUI_IMAGE_TAG)?,
        })
    }
}

/// `data` wins over `binaryData`.
fn lookup(cm: &ConfigMap, key: &'static str) -> Result<String, SettingsError> {
    if let Some(v) = cm.data.as_ref().and_then(|d| d.get(key)) {
        return Ok(v.clone());
    }
    match cm.binary_data.as_ref().and_then(|d| d.get(key)) {
        Some(bytes) => String::from_utf8(bytes.0.clone())
            .map_err(|_| SettingsError::InvalidUtf8(key)),
        None => Err(SettingsError::MissingKey(key)),
    }
}
