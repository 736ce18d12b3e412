use k8s_openapi::api::core::v1::ObjectReference;
use kube::ResourceExt;
use kube::runtime::events::EventType;
use tracing::info;

use super::events::{ACTION_DELETE, REASON_DELETING};
use super::{ControllerContext, ReconcileErr};
use crate::crd::{AIChatWorkspace, FINALIZER};

/// Adds the deletion guard to `ws`. The patch carries the observed
/// resourceVersion so a concurrent writer makes it fail.
pub async fn attach(ws: &AIChatWorkspace, ctx: &ControllerContext) -> Result<(), ReconcileErr> {
    let mut finalizers = ws.finalizers().to_vec();
    if finalizers.iter().any(|f| f == FINALIZER) {
        return Ok(());
    }
    finalizers.push(FINALIZER.to_string());
    info!(name = %ws.name_any(), "adding finalizer");
    ctx.kube
        .set_finalizers(&ws.name_any(), ws.resource_version().as_deref(), &finalizers)
        .await
}

/// Deletes the workspace namespace and only then drops the guard. A failed
/// delete leaves the guard in place.
pub async fn teardown(
    ws: &AIChatWorkspace,
    obj_ref: &ObjectReference,
    ctx: &ControllerContext,
) -> Result<(), ReconcileErr> {
    let namespace = ws.workspace_name();
    info!(namespace, "deleting workspace namespace");
    ctx.kube.delete_namespace(namespace).await?;

    ctx.events
        .publish(
            obj_ref,
            EventType::Warning,
            REASON_DELETING,
            ACTION_DELETE,
            Some(format!("Deleting namespace {namespace}")),
        )
        .await;

    let remaining: Vec<String> = ws
        .finalizers()
        .iter()
        .filter(|f| f.as_str() != FINALIZER)
        .cloned()
        .collect();
    ctx.kube
        .set_finalizers(&ws.name_any(), ws.resource_version().as_deref(), &remaining)
        .await
}
