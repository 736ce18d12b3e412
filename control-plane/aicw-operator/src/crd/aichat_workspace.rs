use kube::{CustomResource, Resource};
use schemars::{
    JsonSchema,
    r#gen::SchemaGenerator,
    schema::{InstanceType, Schema, SchemaObject},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const FINALIZER: &str = "core.aichatworkspace.io/finalizer";
pub const CONDITION_READY: &str = "Ready";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "apps.aichatworkspaces.io",
    version = "v1alpha1",
    kind = "AIChatWorkspace",
    plural = "aichatworkspaces",
    shortname = "aicw",
    status = "AIChatWorkspaceStatus",
    printcolumn = r#"{"name":"Workspace","type":"string","jsonPath":".spec.workspaceName"}"#,
    printcolumn = r#"{"name":"Created","type":"boolean","jsonPath":".status.isCreated"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AIChatWorkspaceSpec {
    /// Tenant name; also the namespace and the prefix of every child.
    /// Cannot be changed after creation.
    #[schemars(schema_with = "immutable_string")]
    pub workspace_name: String,
    /// Passed to the chat front-end as `ENV`.
    #[serde(rename = "workspaceENV", default = "default_workspace_env")]
    pub workspace_env: String,
    /// Models made available in the runtime, in pull order.
    #[serde(default)]
    pub models: Vec<String>,
    /// Named system-prompt patterns cloned onto every pulled model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompt_patterns: Vec<String>,
}

fn default_workspace_env() -> String {
    "dev".to_string()
}

fn immutable_string(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        ..Default::default()
    };
    schema.extensions.insert(
        "x-kubernetes-validations".into(),
        json!([{ "rule": "self == oldSelf", "message": "workspaceName is immutable" }]),
    );
    Schema::Object(schema)
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AIChatWorkspaceStatus {
    /// Set once every child was provisioned; never reset.
    #[serde(default)]
    pub is_created: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl AIChatWorkspace {
    pub fn workspace_name(&self) -> &str {
        &self.spec.workspace_name
    }

    pub fn has_finalizer(&self) -> bool {
        self.meta()
            .finalizers
            .as_ref()
            .map(|f| f.iter().any(|x| x == FINALIZER))
            .unwrap_or(false)
    }

    pub fn is_created(&self) -> bool {
        self.status.as_ref().map(|s| s.is_created).unwrap_or(false)
    }

    pub fn pending_deletion(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }

    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.iter().find(|c| c.type_ == type_))
    }
}
