//! Status reporting for AIChatWorkspace.

use chrono::{SecondsFormat, Utc};
use kube::ResourceExt;
use tracing::debug;

use super::{ReconcileErr, WorkspaceKube};
use crate::crd::{
    AIChatWorkspace, AIChatWorkspaceStatus, CONDITION_READY, Condition, ConditionStatus,
};

pub const REASON_SUCCEEDED: &str = "ReconciliationSucceeded";
pub const REASON_PROGRESSING: &str = "Progressing";
pub const REASON_FAILED: &str = "ReconciliationFailed";

fn ready(status: ConditionStatus, reason: &str, message: String) -> Condition {
    Condition {
        type_: CONDITION_READY.to_string(),
        status,
        reason: reason.to_string(),
        message,
        observed_generation: None,
        last_transition_time: None,
    }
}

pub fn ready_condition() -> Condition {
    ready(
        ConditionStatus::True,
        REASON_SUCCEEDED,
        "AIChatWorkspace reconciled".to_string(),
    )
}

pub fn progressing_condition(message: String) -> Condition {
    ready(ConditionStatus::False, REASON_PROGRESSING, message)
}

pub fn failed_condition(err: &ReconcileErr) -> Condition {
    ready(ConditionStatus::False, REASON_FAILED, err.to_string())
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Upserts `cond` by type. The transition time only moves when the
/// condition's status changes.
pub fn set_condition(conditions: &mut Vec<Condition>, mut cond: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == cond.type_) {
        Some(existing) => {
            cond.last_transition_time = if existing.status == cond.status {
                existing.last_transition_time.take()
            } else {
                Some(now())
            };
            *existing = cond;
        }
        None => {
            cond.last_transition_time = Some(now());
            conditions.push(cond);
        }
    }
}

/// Folds an update into `current`. `is_created` can only move from false
/// to true.
pub fn merge_status(
    current: &AIChatWorkspaceStatus,
    mark_created: bool,
    cond: Option<Condition>,
    generation: Option<i64>,
) -> AIChatWorkspaceStatus {
    let mut next = current.clone();
    next.is_created |= mark_created;
    if let Some(mut cond) = cond {
        cond.observed_generation = generation;
        set_condition(&mut next.conditions, cond);
    }
    next
}

fn same_ignoring_time(a: &AIChatWorkspaceStatus, b: &AIChatWorkspaceStatus) -> bool {
    let strip = |s: &AIChatWorkspaceStatus| {
        let mut s = s.clone();
        for c in &mut s.conditions {
            c.last_transition_time = None;
        }
        s
    };
    strip(a) == strip(b)
}

/// Re-reads the workspace and patches its status subresource when the
/// merged result differs. A deleted workspace is not an error.
pub async fn report_status(
    kube: &dyn WorkspaceKube,
    name: &str,
    mark_created: bool,
    cond: Option<Condition>,
) -> Result<(), ReconcileErr> {
    let Some(latest) = kube.get_workspace(name).await? else {
        debug!(name, "workspace gone; skipping status update");
        return Ok(());
    };
    let current = latest.status.clone().unwrap_or_default();
    let next = merge_status(&current, mark_created, cond, latest.metadata.generation);
    if same_ignoring_time(&current, &next) {
        return Ok(());
    }
    kube.patch_status(&latest.name_any(), latest.resource_version().as_deref(), &next)
        .await
}
