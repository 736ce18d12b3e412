use std::sync::Arc;
use std::time::Duration;

use aicw_ollama::OllamaError;
use futures_util::StreamExt;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{
    Namespace, PersistentVolumeClaim, ResourceQuota, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    Api, Client, Resource,
    core::DynamicObject,
    runtime::{
        Controller, controller::Action, reflector::ObjectRef,
        watcher::Config as WatcherConfig,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::OperatorConfig;
use crate::crd::AIChatWorkspace;
use crate::manifests::{http_scaled_object_resource, labels::managed_selector};
use crate::settings::SettingsError;

pub mod client;
pub mod ensure;
pub mod events;
pub mod finalizer;
pub mod models;
pub mod provision;
pub mod reconcile;
pub mod status;
pub mod steps;

pub use client::{KubeWorkspaceClient, WorkspaceKube};
pub use events::{EventPublisher, KubeEventPublisher};
pub use models::{ModelRuntimeFactory, OllamaRuntimeFactory};

#[cfg(test)]
mod test_support;

pub const CONTROLLER_NAME: &str = "aichat-workspace-operator";

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error("kube error: {0}")]
    Kube(#[from] kube::Error),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("model runtime error: {0}")]
    ModelRuntime(#[from] OllamaError),
    #[error("pull of model {model} timed out after {after:?}")]
    PullTimeout { model: String, after: Duration },
    #[error("reconcile cancelled")]
    Cancelled,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// How soon a workspace should be looked at again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requeue {
    Immediate,
    Success,
    Readiness,
    /// Only a new change notification wakes the workspace up.
    Never,
}

impl Requeue {
    pub fn into_action(self, cfg: &OperatorConfig) -> Action {
        match self {
            Requeue::Immediate => Action::requeue(Duration::ZERO),
            Requeue::Success => Action::requeue(cfg.intervals.success()),
            Requeue::Readiness => Action::requeue(cfg.intervals.readiness()),
            Requeue::Never => Action::await_change(),
        }
    }
}

/// Shared state handed to every reconcile.
pub struct ControllerContext {
    pub kube: Arc<dyn WorkspaceKube>,
    pub events: Arc<dyn EventPublisher>,
    pub runtimes: Arc<dyn ModelRuntimeFactory>,
    pub cfg: OperatorConfig,
    /// Cancelled on process shutdown; each reconcile derives a child token.
    pub shutdown: CancellationToken,
}

impl ControllerContext {
    pub fn new(
        client: Client,
        cfg: OperatorConfig,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let runtimes = OllamaRuntimeFactory::new(
            cfg.cluster_domain.clone(),
            cfg.intervals.ollama_request_timeout(),
        )?;
        Ok(Self {
            kube: Arc::new(KubeWorkspaceClient::new(client.clone())),
            events: Arc::new(KubeEventPublisher::new(client, CONTROLLER_NAME)),
            runtimes: Arc::new(runtimes),
            cfg,
            shutdown,
        })
    }
}

/// Maps a child back to the workspace named in its controller owner reference.
fn owning_workspace<K: Resource>(child: K) -> Option<ObjectRef<AIChatWorkspace>> {
    child
        .meta()
        .owner_references
        .as_ref()?
        .iter()
        .find(|o| o.kind == "AIChatWorkspace" && o.controller == Some(true))
        .map(|o| ObjectRef::new(&o.name))
}

pub async fn run_controller(
    client: Client,
    cfg: OperatorConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let api: Api<AIChatWorkspace> = Api::all(client.clone());
    let children = WatcherConfig::default().labels(&managed_selector());
    let concurrency = cfg.max_concurrent_reconciles;
    let ctx = Arc::new(ControllerContext::new(
        client.clone(),
        cfg,
        shutdown.clone(),
    )?);

    let mut controller = Controller::new(api, WatcherConfig::default())
        .with_config(
            kube::runtime::controller::Config::default().concurrency(concurrency),
        )
        .watches(Api::<Namespace>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<ResourceQuota>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<PersistentVolumeClaim>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<ServiceAccount>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<StatefulSet>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<Service>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<Deployment>::all(client.clone()), children.clone(), owning_workspace)
        .watches(Api::<Ingress>::all(client.clone()), children.clone(), owning_workspace);

    if ctx.cfg.features.scale_to_zero {
        let ar = http_scaled_object_resource();
        controller = controller.watches_with(
            Api::<DynamicObject>::all_with(client.clone(), &ar),
            ar,
            children,
            owning_workspace,
        );
    }

    info!(concurrency, "starting AIChatWorkspace controller");
    controller
        .graceful_shutdown_on(shutdown.cancelled_owned())
        .run(reconcile::reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj_ref, action)) => {
                    info!(name = %obj_ref.name, ?action, "reconciled")
                }
                Err(e) => warn!(error = %e, "reconcile failed"),
            }
        })
        .await;

    info!("controller stopped");
    Ok(())
}

pub(crate) fn error_policy(
    obj: Arc<AIChatWorkspace>,
    err: &ReconcileErr,
    ctx: Arc<ControllerContext>,
) -> Action {
    error!(name = %obj.metadata.name.as_deref().unwrap_or_default(), error = %err, "reconcile error; retrying");
    Action::requeue(ctx.cfg.intervals.error())
}
