//! Readiness gate for the model runtime and declared-model sync.

use std::sync::Arc;
use std::time::Duration;

use aicw_ollama::{ModelRuntime, OllamaClient, pattern_variant, variant_name};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{ControllerContext, ReconcileErr};
use crate::crd::AIChatWorkspace;
use crate::manifests::factory::OLLAMA_PORT;
use crate::manifests::labels::{runtime_base_url, runtime_name};

const EXPECTED_RUNTIME_REPLICAS: i32 = 1;

/// Hands out a model-runtime client for a workspace.
pub trait ModelRuntimeFactory: Send + Sync {
    fn for_workspace(&self, workspace: &str) -> Arc<dyn ModelRuntime>;
}

/// Builds [`OllamaClient`]s against the in-cluster runtime Service.
pub struct OllamaRuntimeFactory {
    http: reqwest::Client,
    cluster_domain: String,
    request_timeout: Duration,
}

impl OllamaRuntimeFactory {
    pub fn new(
        cluster_domain: String,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("aicw-operator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            cluster_domain,
            request_timeout,
        })
    }
}

impl ModelRuntimeFactory for OllamaRuntimeFactory {
    fn for_workspace(&self, workspace: &str) -> Arc<dyn ModelRuntime> {
        let url = runtime_base_url(workspace, &self.cluster_domain, OLLAMA_PORT);
        Arc::new(OllamaClient::with_http(
            self.http.clone(),
            url,
            self.request_timeout,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeSync {
    NotReady,
    Synced,
}

/// Checks runtime readiness and, once ready, pulls every declared model
/// missing from the runtime's inventory.
#[instrument(skip_all, fields(workspace = %ws.workspace_name()))]
pub async fn sync_runtime(
    ws: &AIChatWorkspace,
    ctx: &ControllerContext,
    cancel: &CancellationToken,
) -> Result<RuntimeSync, ReconcileErr> {
    let name = ws.workspace_name();
    let ready = ctx
        .kube
        .stateful_set_ready_replicas(name, &runtime_name(name))
        .await?;
    if ready < EXPECTED_RUNTIME_REPLICAS {
        info!(
            ready,
            expected = EXPECTED_RUNTIME_REPLICAS,
            "model runtime not ready yet"
        );
        return Ok(RuntimeSync::NotReady);
    }

    let runtime = ctx.runtimes.for_workspace(name);
    sync_models(
        runtime.clone(),
        &ws.spec.models,
        &ws.spec.prompt_patterns,
        ctx.cfg.intervals.model_pull_timeout(),
        cancel,
    )
    .await?;

    let running = runtime.list_running_models().await?;
    info!(
        running = ?running.iter().map(|m| m.identifier()).collect::<Vec<_>>(),
        "models running"
    );
    Ok(RuntimeSync::Synced)
}

/// Pulls each model absent from the inventory, in order, then creates each
/// of its prompt-pattern variants the runtime does not have yet. The first
/// failure stops the loop.
pub async fn sync_models(
    runtime: Arc<dyn ModelRuntime>,
    models: &[String],
    patterns: &[String],
    pull_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(), ReconcileErr> {
    for model in models {
        if runtime.does_model_exist(model).await? {
            debug!(%model, "model present");
        } else {
            pull_bounded(runtime.clone(), model, pull_timeout, cancel).await?;
        }
        for pattern in patterns {
            let Some(file) = pattern_variant(model, pattern) else {
                warn!(%model, %pattern, "unknown prompt pattern; skipping");
                continue;
            };
            let variant = variant_name(model, pattern);
            if runtime.does_model_exist(&variant).await? {
                continue;
            }
            runtime.create_model(&variant, &file).await?;
        }
    }
    Ok(())
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs a pull on its own task, bounded by `limit` and `cancel`. The task
/// is aborted when this future resolves early or is dropped.
async fn pull_bounded(
    runtime: Arc<dyn ModelRuntime>,
    model: &str,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<(), ReconcileErr> {
    let owned = model.to_string();
    let mut task = tokio::spawn(async move { runtime.pull_model(&owned).await });
    let _abort = AbortOnDrop(task.abort_handle());

    tokio::select! {
        res = tokio::time::timeout(limit, &mut task) => match res {
            Ok(Ok(pulled)) => Ok(pulled?),
            Ok(Err(join)) => Err(ReconcileErr::Internal(format!(
                "pull task for {model} failed: {join}"
            ))),
            Err(_) => {
                warn!(%model, ?limit, "model pull timed out");
                Err(ReconcileErr::PullTimeout {
                    model: model.to_string(),
                    after: limit,
                })
            }
        },
        _ = cancel.cancelled() => {
            info!(%model, "model pull cancelled");
            Err(ReconcileErr::Cancelled)
        }
    }
}
