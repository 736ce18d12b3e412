//! The workspace lifecycle as a table of guarded steps.
//!
//! Each pass classifies the workspace into a [`WorkspaceState`] and runs the
//! first step whose guard matches. A state matching no row is at rest.

use crate::crd::AIChatWorkspace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Finalizer,
    Create,
    Abandon,
    Update,
    Delete,
}

/// Lifecycle-relevant facts about a workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkspaceState {
    pub has_finalizer: bool,
    pub is_created: bool,
    pub pending_deletion: bool,
}

impl WorkspaceState {
    pub fn of(ws: &AIChatWorkspace) -> Self {
        Self {
            has_finalizer: ws.has_finalizer(),
            is_created: ws.is_created(),
            pending_deletion: ws.pending_deletion(),
        }
    }
}

/// `None` matches either value.
#[derive(Clone, Copy, Debug)]
pub struct Guard {
    pub has_finalizer: Option<bool>,
    pub is_created: Option<bool>,
    pub pending_deletion: Option<bool>,
}

impl Guard {
    pub fn matches(&self, state: &WorkspaceState) -> bool {
        fn check(want: Option<bool>, got: bool) -> bool {
            want.is_none_or(|w| w == got)
        }
        check(self.has_finalizer, state.has_finalizer)
            && check(self.is_created, state.is_created)
            && check(self.pending_deletion, state.pending_deletion)
    }
}

pub const TRANSITIONS: &[(Guard, Step)] = &[
    (
        Guard {
            has_finalizer: Some(false),
            is_created: None,
            pending_deletion: Some(false),
        },
        Step::Finalizer,
    ),
    (
        Guard {
            has_finalizer: None,
            is_created: Some(false),
            pending_deletion: Some(false),
        },
        Step::Create,
    ),
    (
        Guard {
            has_finalizer: None,
            is_created: Some(false),
            pending_deletion: Some(true),
        },
        Step::Abandon,
    ),
    (
        Guard {
            has_finalizer: None,
            is_created: Some(true),
            pending_deletion: Some(false),
        },
        Step::Update,
    ),
    (
        Guard {
            has_finalizer: Some(true),
            is_created: Some(true),
            pending_deletion: Some(true),
        },
        Step::Delete,
    ),
];

pub fn select_step(state: &WorkspaceState) -> Option<Step> {
    TRANSITIONS
        .iter()
        .find(|(guard, _)| guard.matches(state))
        .map(|(_, step)| *step)
}
