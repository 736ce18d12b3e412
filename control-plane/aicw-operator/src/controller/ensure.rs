use kube::{Resource, ResourceExt};
use tracing::{debug, info};

use super::{ReconcileErr, WorkspaceKube};
use crate::crd::AIChatWorkspace;
use crate::manifests::ChildResource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ensured {
    Created,
    Present,
}

/// Creates `desired` owned by `owner` unless an object of the same kind,
/// name and namespace already exists. Existing objects are never compared
/// or patched.
pub async fn ensure(
    kube: &dyn WorkspaceKube,
    owner: &AIChatWorkspace,
    mut desired: ChildResource,
) -> Result<Ensured, ReconcileErr> {
    let kind = desired.kind();
    if kube.child_exists(&desired).await? {
        debug!(kind, name = desired.name(), "child present");
        return Ok(Ensured::Present);
    }

    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        ReconcileErr::Internal(format!(
            "workspace {} has no uid; cannot own children",
            owner.name_any()
        ))
    })?;
    desired.set_owner(owner_ref);

    info!(
        kind,
        name = desired.name(),
        ns = desired.namespace().unwrap_or_default(),
        "creating child"
    );
    kube.create_child(&desired).await?;
    Ok(Ensured::Created)
}
