use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ModelEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
}

impl ModelEntry {
    /// `/api/tags` fills `model`, older servers only `name`.
    pub fn identifier(&self) -> &str {
        if self.model.is_empty() {
            &self.name
        } else {
            &self.model
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PullRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRequest<'a> {
    pub model: &'a str,
    pub from: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    #[serde(skip_serializing_if = "no_parameters")]
    pub parameters: &'a BTreeMap<String, Value>,
    pub stream: bool,
}

fn no_parameters(parameters: &&BTreeMap<String, Value>) -> bool {
    parameters.is_empty()
}

/// One NDJSON line of a pull/create progress stream.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProgressResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
}

impl ProgressResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}
