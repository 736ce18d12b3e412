//! In-memory fakes of the cluster, event and model-runtime seams.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use aicw_ollama::{ModelEntry, ModelFile, ModelRuntime, OllamaError, canonical_model_name};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, ObjectReference};
use kube::runtime::events::EventType;
use tokio_util::sync::CancellationToken;

use super::{ControllerContext, EventPublisher, ModelRuntimeFactory, ReconcileErr, WorkspaceKube};
use crate::config::OperatorConfig;
use crate::crd::{AIChatWorkspace, AIChatWorkspaceSpec, AIChatWorkspaceStatus};
use crate::manifests::ChildResource;
use crate::settings::{KEY_DEFAULT_DOMAIN, KEY_OLLAMA_IMAGE_TAG, KEY_OPENWEBUI_IMAGE_TAG};

pub type ChildKey = (&'static str, Option<String>, String);

pub fn key_of(child: &ChildResource) -> ChildKey {
    (
        child.kind(),
        child.namespace().map(str::to_string),
        child.name().to_string(),
    )
}

#[derive(Default)]
pub struct KubeState {
    pub workspaces: BTreeMap<String, AIChatWorkspace>,
    pub children: BTreeMap<ChildKey, ChildResource>,
    /// `Kind/name` in creation order.
    pub created: Vec<String>,
    /// Cluster writes in order, e.g. `delete_namespace:team-a`.
    pub writes: Vec<String>,
    pub ready_replicas: i32,
    pub settings: Option<ConfigMap>,
    pub fail_namespace_delete: bool,
    /// Number of upcoming workspace writes that another writer beats.
    pub concurrent_writes: u32,
    /// Workspace writes that lost to another writer, in order.
    pub conflicts: Vec<String>,
    next_rv: u64,
}

impl KubeState {
    fn bump(&mut self, name: &str) {
        self.next_rv += 1;
        let rv = (self.next_rv + 100).to_string();
        if let Some(ws) = self.workspaces.get_mut(name) {
            ws.metadata.resource_version = Some(rv);
        }
    }

    fn interfere(&mut self, name: &str, op: &str) {
        if self.concurrent_writes > 0 {
            self.concurrent_writes -= 1;
            self.conflicts.push(op.to_string());
            self.bump(name);
        }
    }

    fn check_rv(&self, name: &str, rv: Option<&str>) -> Result<(), ReconcileErr> {
        let current = self
            .workspaces
            .get(name)
            .and_then(|w| w.metadata.resource_version.as_deref());
        match rv {
            Some(rv) if Some(rv) != current => {
                Err(ReconcileErr::Internal(format!("conflict on {name}")))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeKube {
    pub state: Mutex<KubeState>,
}

impl FakeKube {
    pub fn with_workspace(ws: AIChatWorkspace) -> Arc<Self> {
        let kube = Self::default();
        {
            let mut s = kube.state.lock().unwrap();
            s.settings = Some(settings_config_map());
            s.workspaces.insert(ws.metadata.name.clone().unwrap(), ws);
        }
        Arc::new(kube)
    }

    pub fn workspace(&self, name: &str) -> Option<AIChatWorkspace> {
        self.state.lock().unwrap().workspaces.get(name).cloned()
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn conflicts(&self) -> Vec<String> {
        self.state.lock().unwrap().conflicts.clone()
    }

    pub fn set_ready_replicas(&self, n: i32) {
        self.state.lock().unwrap().ready_replicas = n;
    }

    /// Marks the workspace as deleted by the API server.
    pub fn request_deletion(&self, name: &str) {
        let mut s = self.state.lock().unwrap();
        if let Some(ws) = s.workspaces.get_mut(name) {
            ws.metadata.deletion_timestamp =
                Some(serde_json::from_value(serde_json::json!("2026-10-19T00:00:00Z")).unwrap());
        }
        s.bump(name);
    }
}

#[async_trait]
impl WorkspaceKube for FakeKube {
    async fn get_workspace(
        &self,
        name: &str,
    ) -> Result<Option<AIChatWorkspace>, ReconcileErr> {
        Ok(self.workspace(name))
    }

    async fn set_finalizers(
        &self,
        name: &str,
        resource_version: Option<&str>,
        finalizers: &[String],
    ) -> Result<(), ReconcileErr> {
        let mut s = self.state.lock().unwrap();
        s.interfere(name, "set_finalizers");
        s.check_rv(name, resource_version)?;
        s.writes.push(format!("set_finalizers:{}", finalizers.join(",")));
        let Some(ws) = s.workspaces.get_mut(name) else {
            return Ok(());
        };
        ws.metadata.finalizers = Some(finalizers.to_vec());
        if finalizers.is_empty() && ws.metadata.deletion_timestamp.is_some() {
            s.workspaces.remove(name);
        } else {
            s.bump(name);
        }
        Ok(())
    }

    async fn patch_status(
        &self,
        name: &str,
        resource_version: Option<&str>,
        status: &AIChatWorkspaceStatus,
    ) -> Result<(), ReconcileErr> {
        let mut s = self.state.lock().unwrap();
        s.interfere(name, "patch_status");
        s.check_rv(name, resource_version)?;
        s.writes.push("patch_status".to_string());
        if let Some(ws) = s.workspaces.get_mut(name) {
            ws.status = Some(status.clone());
        }
        s.bump(name);
        Ok(())
    }

    async fn child_exists(&self, child: &ChildResource) -> Result<bool, ReconcileErr> {
        Ok(self.state.lock().unwrap().children.contains_key(&key_of(child)))
    }

    async fn create_child(&self, child: &ChildResource) -> Result<(), ReconcileErr> {
        let mut s = self.state.lock().unwrap();
        s.created.push(format!("{}/{}", child.kind(), child.name()));
        s.writes.push(format!("create:{}/{}", child.kind(), child.name()));
        s.children.insert(key_of(child), child.clone());
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ReconcileErr> {
        let mut s = self.state.lock().unwrap();
        if s.fail_namespace_delete {
            return Err(ReconcileErr::Internal(format!("cannot delete {name}")));
        }
        s.writes.push(format!("delete_namespace:{name}"));
        s.children.retain(|(kind, ns, n), _| {
            !(*kind == "Namespace" && n == name) && ns.as_deref() != Some(name)
        });
        Ok(())
    }

    async fn stateful_set_ready_replicas(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<i32, ReconcileErr> {
        let s = self.state.lock().unwrap();
        let key = ("StatefulSet", Some(ns.to_string()), name.to_string());
        Ok(if s.children.contains_key(&key) {
            s.ready_replicas
        } else {
            0
        })
    }

    async fn get_config_map(
        &self,
        _ns: &str,
        _name: &str,
    ) -> Result<Option<ConfigMap>, ReconcileErr> {
        Ok(self.state.lock().unwrap().settings.clone())
    }
}

#[derive(Default)]
pub struct RuntimeState {
    /// Canonical identifiers present in the runtime.
    pub inventory: BTreeSet<String>,
    pub pulls: Vec<String>,
    pub creates: Vec<String>,
    pub fail_pull: bool,
    pub hang_pull: bool,
    pub fail_create: bool,
}

#[derive(Default)]
pub struct FakeRuntime {
    pub state: Mutex<RuntimeState>,
}

impl FakeRuntime {
    pub fn pulls(&self) -> Vec<String> {
        self.state.lock().unwrap().pulls.clone()
    }

    pub fn creates(&self) -> Vec<String> {
        self.state.lock().unwrap().creates.clone()
    }

    pub fn preload(&self, model: &str) {
        self.state
            .lock()
            .unwrap()
            .inventory
            .insert(canonical_model_name(model));
    }
}

#[async_trait]
impl ModelRuntime for FakeRuntime {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .inventory
            .iter()
            .map(|m| ModelEntry {
                name: m.clone(),
                model: m.clone(),
                ..Default::default()
            })
            .collect())
    }

    async fn pull_model(&self, name: &str) -> Result<(), OllamaError> {
        let hang = {
            let mut s = self.state.lock().unwrap();
            s.pulls.push(name.to_string());
            if s.fail_pull {
                return Err(OllamaError::Remote(format!("pull {name} failed")));
            }
            s.hang_pull
        };
        if hang {
            std::future::pending::<()>().await;
        }
        self.state
            .lock()
            .unwrap()
            .inventory
            .insert(canonical_model_name(name));
        Ok(())
    }

    async fn create_model(&self, name: &str, _file: &ModelFile) -> Result<(), OllamaError> {
        let mut s = self.state.lock().unwrap();
        s.creates.push(name.to_string());
        if s.fail_create {
            return Err(OllamaError::Remote(format!("create {name} failed")));
        }
        s.inventory.insert(canonical_model_name(name));
        Ok(())
    }

    async fn list_running_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        Ok(vec![])
    }
}

pub struct FakeFactory(pub Arc<FakeRuntime>);

impl ModelRuntimeFactory for FakeFactory {
    fn for_workspace(&self, _workspace: &str) -> Arc<dyn ModelRuntime> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    pub events: Mutex<Vec<(String, String)>>,
}

impl RecordingEvents {
    /// `(type, reason)` pairs in publish order.
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEvents {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
        self.events
            .lock()
            .unwrap()
            .push((format!("{type_:?}"), reason.to_string()));
    }
}

pub struct Harness {
    pub kube: Arc<FakeKube>,
    pub runtime: Arc<FakeRuntime>,
    pub events: Arc<RecordingEvents>,
    pub ctx: ControllerContext,
}

impl Harness {
    pub fn new(ws: AIChatWorkspace) -> Self {
        Self::with_config(ws, OperatorConfig::default())
    }

    pub fn with_config(ws: AIChatWorkspace, cfg: OperatorConfig) -> Self {
        let kube = FakeKube::with_workspace(ws);
        let runtime = Arc::new(FakeRuntime::default());
        let events = Arc::new(RecordingEvents::default());
        let ctx = ControllerContext {
            kube: kube.clone(),
            events: events.clone(),
            runtimes: Arc::new(FakeFactory(runtime.clone())),
            cfg,
            shutdown: CancellationToken::new(),
        };
        Self {
            kube,
            runtime,
            events,
            ctx,
        }
    }
}

pub fn workspace(name: &str, models: &[&str]) -> AIChatWorkspace {
    let mut ws = AIChatWorkspace::new(
        name,
        AIChatWorkspaceSpec {
            workspace_name: name.to_string(),
            workspace_env: "dev".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            prompt_patterns: vec![],
        },
    );
    ws.metadata.uid = Some(format!("uid-{name}"));
    ws.metadata.resource_version = Some("1".to_string());
    ws.metadata.generation = Some(1);
    ws
}

pub fn settings_config_map() -> ConfigMap {
    ConfigMap {
        data: Some(BTreeMap::from([
            (KEY_DEFAULT_DOMAIN.to_string(), "example.com".to_string()),
            (KEY_OLLAMA_IMAGE_TAG.to_string(), "0.3.12".to_string()),
            (KEY_OPENWEBUI_IMAGE_TAG.to_string(), "main".to_string()),
        ])),
        ..Default::default()
    }
}
