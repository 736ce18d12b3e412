//! The ordered provisioning sequence of a workspace.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::ensure::{Ensured, ensure};
use super::models::{RuntimeSync, sync_runtime};
use super::{ControllerContext, ReconcileErr};
use crate::config::OperatorConfig;
use crate::crd::AIChatWorkspace;
use crate::manifests::ChildResource;
use crate::manifests::factory::{self, ChatEnv};
use crate::manifests::labels::{self, component, standard_labels};
use crate::settings::{SettingsError, WorkspaceSettings};

/// One entry of the provisioning sequence.
#[derive(Clone, Debug)]
pub enum PlanStep {
    Ensure(ChildResource),
    /// Wait for the model runtime, then sync declared models into it.
    RuntimeReadiness,
}

/// Result of one pass over the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// A child was created; the pass stopped there.
    Created { kind: &'static str, name: String },
    AwaitingReadiness,
    Complete,
}

/// Builds the dependency-ordered sequence for `ws`.
pub fn plan(
    ws: &AIChatWorkspace,
    settings: &WorkspaceSettings,
    cfg: &OperatorConfig,
) -> Vec<PlanStep> {
    let name = ws.workspace_name();
    let chat = labels::chat_name(name);
    let runtime = labels::runtime_name(name);
    let quota = labels::quota_name(name);
    let interceptor = labels::interceptor_name(name);
    let chat_host = labels::chat_host(name, &settings.default_domain);
    let runtime_url =
        labels::runtime_base_url(name, &cfg.cluster_domain, factory::OLLAMA_PORT);

    let mut steps = vec![
        PlanStep::Ensure(ChildResource::Namespace(factory::namespace(
            name,
            standard_labels(name, name, component::NAMESPACE),
        ))),
        PlanStep::Ensure(ChildResource::ResourceQuota(factory::resource_quota(
            name,
            &quota,
            standard_labels(name, &quota, component::RESOURCE_QUOTA),
        ))),
        PlanStep::Ensure(ChildResource::PersistentVolumeClaim(
            factory::persistent_volume_claim(
                name,
                &chat,
                factory::OPENWEBUI_VOLUME_SIZE,
                standard_labels(name, &chat, component::PVC),
            ),
        )),
        PlanStep::Ensure(ChildResource::ServiceAccount(factory::service_account(
            name,
            &chat,
            standard_labels(name, &chat, component::SERVICE_ACCOUNT),
        ))),
        PlanStep::Ensure(ChildResource::ServiceAccount(factory::service_account(
            name,
            &runtime,
            standard_labels(name, &runtime, component::SERVICE_ACCOUNT),
        ))),
        PlanStep::Ensure(ChildResource::StatefulSet(factory::ollama_stateful_set(
            name,
            &runtime,
            factory::OLLAMA_PORT,
            &settings.ollama_image_tag,
            factory::OLLAMA_VOLUME_SIZE,
            standard_labels(name, &runtime, component::MODEL_RUNTIME),
        ))),
        PlanStep::Ensure(ChildResource::Service(factory::cluster_ip_service(
            name,
            &runtime,
            factory::OLLAMA_PORT,
            standard_labels(name, &runtime, component::SERVICE),
        ))),
        PlanStep::RuntimeReadiness,
        PlanStep::Ensure(ChildResource::Deployment(factory::openwebui_deployment(
            name,
            &chat,
            factory::OPENWEBUI_PORT,
            &settings.openwebui_image_tag,
            &ChatEnv {
                workspace: name,
                workspace_env: &ws.spec.workspace_env,
                runtime_url: &runtime_url,
            },
            standard_labels(name, &chat, component::CHAT_UI),
        ))),
        PlanStep::Ensure(ChildResource::Service(factory::cluster_ip_service(
            name,
            &chat,
            factory::OPENWEBUI_PORT,
            standard_labels(name, &chat, component::SERVICE),
        ))),
        PlanStep::Ensure(ChildResource::Service(factory::external_name_service(
            name,
            &interceptor,
            factory::KEDA_INTERCEPTOR_PROXY,
            standard_labels(name, &interceptor, component::SERVICE),
        ))),
        PlanStep::Ensure(ChildResource::Ingress(factory::ingress(
            name,
            &chat,
            &chat_host,
            &chat,
            factory::OPENWEBUI_PORT,
            standard_labels(name, &chat, component::INGRESS),
        ))),
        PlanStep::Ensure(ChildResource::Ingress(factory::ingress(
            name,
            &runtime,
            &labels::runtime_host(name, &settings.default_domain),
            &runtime,
            factory::OLLAMA_PORT,
            standard_labels(name, &runtime, component::INGRESS),
        ))),
    ];

    if cfg.features.scale_to_zero {
        steps.push(PlanStep::Ensure(ChildResource::ScaledObject(
            factory::http_scaled_object(
                name,
                &chat,
                factory::OPENWEBUI_PORT,
                &[chat_host],
                standard_labels(name, &chat, component::AUTOSCALING),
            ),
        )));
    }
    steps
}

pub async fn load_settings(
    ctx: &ControllerContext,
) -> Result<WorkspaceSettings, ReconcileErr> {
    let ns = &ctx.cfg.settings_namespace;
    let name = &ctx.cfg.settings_configmap;
    let cm = ctx.kube.get_config_map(ns, name).await?.ok_or_else(|| {
        SettingsError::NotFound {
            namespace: ns.clone(),
            name: name.clone(),
        }
    })?;
    Ok(WorkspaceSettings::from_config_map(&cm)?)
}

/// Runs the sequence once, stopping at the first creation or while the
/// model runtime is not ready.
pub async fn provision(
    ws: &AIChatWorkspace,
    ctx: &ControllerContext,
    cancel: &CancellationToken,
) -> Result<SequenceOutcome, ReconcileErr> {
    let settings = load_settings(ctx).await?;
    for step in plan(ws, &settings, &ctx.cfg) {
        match step {
            PlanStep::Ensure(child) => {
                let kind = child.kind();
                let name = child.name().to_string();
                if ensure(ctx.kube.as_ref(), ws, child).await? == Ensured::Created {
                    return Ok(SequenceOutcome::Created { kind, name });
                }
            }
            PlanStep::RuntimeReadiness => {
                if sync_runtime(ws, ctx, cancel).await? == RuntimeSync::NotReady {
                    return Ok(SequenceOutcome::AwaitingReadiness);
                }
            }
        }
    }
    info!(workspace = ws.workspace_name(), "all children present");
    Ok(SequenceOutcome::Complete)
}
