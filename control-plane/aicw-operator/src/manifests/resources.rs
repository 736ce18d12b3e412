use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{
    Namespace, PersistentVolumeClaim, ResourceQuota, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    ObjectMeta, OwnerReference,
};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};

/// A desired child object of a workspace.
#[derive(Clone, Debug)]
pub enum ChildResource {
    Namespace(Namespace),
    ResourceQuota(ResourceQuota),
    PersistentVolumeClaim(PersistentVolumeClaim),
    ServiceAccount(ServiceAccount),
    StatefulSet(StatefulSet),
    Service(Service),
    Deployment(Deployment),
    Ingress(Ingress),
    /// KEDA `HTTPScaledObject`; no typed binding exists.
    ScaledObject(DynamicObject),
}

impl ChildResource {
    pub fn kind(&self) -> &'static str {
        match self {
            ChildResource::Namespace(_) => "Namespace",
            ChildResource::ResourceQuota(_) => "ResourceQuota",
            ChildResource::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            ChildResource::ServiceAccount(_) => "ServiceAccount",
            ChildResource::StatefulSet(_) => "StatefulSet",
            ChildResource::Service(_) => "Service",
            ChildResource::Deployment(_) => "Deployment",
            ChildResource::Ingress(_) => "Ingress",
            ChildResource::ScaledObject(_) => "HTTPScaledObject",
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            ChildResource::Namespace(o) => &o.metadata,
            ChildResource::ResourceQuota(o) => &o.metadata,
            ChildResource::PersistentVolumeClaim(o) => &o.metadata,
            ChildResource::ServiceAccount(o) => &o.metadata,
            ChildResource::StatefulSet(o) => &o.metadata,
            ChildResource::Service(o) => &o.metadata,
            ChildResource::Deployment(o) => &o.metadata,
            ChildResource::Ingress(o) => &o.metadata,
            ChildResource::ScaledObject(o) => &o.metadata,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ChildResource::Namespace(o) => &mut o.metadata,
            ChildResource::ResourceQuota(o) => &mut o.metadata,
            ChildResource::PersistentVolumeClaim(o) => &mut o.metadata,
            ChildResource::ServiceAccount(o) => &mut o.metadata,
            ChildResource::StatefulSet(o) => &mut o.metadata,
            ChildResource::Service(o) => &mut o.metadata,
            ChildResource::Deployment(o) => &mut o.metadata,
            ChildResource::Ingress(o) => &mut o.metadata,
            ChildResource::ScaledObject(o) => &mut o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    /// `None` for cluster-scoped kinds.
    pub fn namespace(&self) -> Option<&str> {
        self.meta().namespace.as_deref()
    }

    /// Replaces any existing owner references with `owner`.
    pub fn set_owner(&mut self, owner: OwnerReference) {
        self.meta_mut().owner_references = Some(vec![owner]);
    }
}

pub fn http_scaled_object_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("http.keda.sh", "v1alpha1", "HTTPScaledObject"),
        "httpscaledobjects",
    )
}
