use std::sync::Arc;

use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::events::{ACTION_PROVISION, REASON_CREATED};
use super::finalizer;
use super::provision::{SequenceOutcome, provision};
use super::status::{failed_condition, progressing_condition, ready_condition, report_status};
use super::steps::{Step, WorkspaceState, select_step};
use super::{ControllerContext, ReconcileErr, Requeue};
use crate::crd::AIChatWorkspace;

#[instrument(skip_all, fields(name = %obj.name_any()))]
pub async fn reconcile(
    obj: Arc<AIChatWorkspace>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileErr> {
    // Dropping this future (or shutting down) cancels in-flight pulls.
    let cancel = ctx.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let requeue = reconcile_workspace(&obj.name_any(), &ctx, &cancel).await?;
    Ok(requeue.into_action(&ctx.cfg))
}

/// Loads the named workspace, picks its step and runs it.
pub async fn reconcile_workspace(
    name: &str,
    ctx: &ControllerContext,
    cancel: &CancellationToken,
) -> Result<Requeue, ReconcileErr> {
    let Some(ws) = ctx.kube.get_workspace(name).await? else {
        debug!(name, "workspace not found");
        return Ok(Requeue::Never);
    };
    let state = WorkspaceState::of(&ws);
    let Some(step) = select_step(&state) else {
        debug!(?state, "workspace at rest");
        return Ok(Requeue::Success);
    };
    debug!(?step, ?state, "running step");

    let result = run_step(step, &ws, ctx, cancel).await;
    if let Err(err) = &result {
        if !matches!(err, ReconcileErr::Cancelled) {
            if let Err(e) =
                report_status(ctx.kube.as_ref(), name, false, Some(failed_condition(err))).await
            {
                warn!(error = %e, "failed to record failure condition");
            }
        }
    }
    result
}

async fn run_step(
    step: Step,
    ws: &AIChatWorkspace,
    ctx: &ControllerContext,
    cancel: &CancellationToken,
) -> Result<Requeue, ReconcileErr> {
    match step {
        Step::Finalizer => {
            finalizer::attach(ws, ctx).await?;
            Ok(Requeue::Immediate)
        }
        Step::Create | Step::Update => provision_pass(step, ws, ctx, cancel).await,
        Step::Abandon => {
            info!("deletion requested before provisioning finished");
            Ok(Requeue::Success)
        }
        Step::Delete => {
            finalizer::teardown(ws, &ws.object_ref(&()), ctx).await?;
            Ok(Requeue::Never)
        }
    }
}

async fn provision_pass(
    step: Step,
    ws: &AIChatWorkspace,
    ctx: &ControllerContext,
    cancel: &CancellationToken,
) -> Result<Requeue, ReconcileErr> {
    let name = ws.name_any();
    let kube = ctx.kube.as_ref();
    match provision(ws, ctx, cancel).await? {
        SequenceOutcome::Created { kind, name: child } => {
            let msg = format!("created {kind} {child}");
            report_status(kube, &name, false, Some(progressing_condition(msg))).await?;
            Ok(match step {
                Step::Update => Requeue::Immediate,
                _ => Requeue::Success,
            })
        }
        SequenceOutcome::AwaitingReadiness => {
            let msg = "waiting for the model runtime to become ready".to_string();
            report_status(kube, &name, false, Some(progressing_condition(msg))).await?;
            Ok(Requeue::Readiness)
        }
        SequenceOutcome::Complete => {
            let first = step == Step::Create;
            report_status(kube, &name, first, Some(ready_condition())).await?;
            if first {
                ctx.events
                    .publish(
                        &ws.object_ref(&()),
                        EventType::Normal,
                        REASON_CREATED,
                        ACTION_PROVISION,
                        Some(format!("Workspace {} provisioned", ws.workspace_name())),
                    )
                    .await;
                info!(workspace = ws.workspace_name(), "workspace provisioned");
            }
            Ok(Requeue::Success)
        }
    }
}
