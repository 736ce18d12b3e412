use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use kube::{
    Api, Client, Resource,
    api::{DeleteParams, Patch, PatchParams, PostParams},
    core::DynamicObject,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::debug;

use super::ReconcileErr;
use crate::crd::{AIChatWorkspace, AIChatWorkspaceStatus};
use crate::manifests::{ChildResource, http_scaled_object_resource};

/// Cluster operations the reconciler needs.
#[async_trait]
pub trait WorkspaceKube: Send + Sync {
    async fn get_workspace(
        &self,
        name: &str,
    ) -> Result<Option<AIChatWorkspace>, ReconcileErr>;

    /// Merge-patches `metadata.finalizers`; `resource_version` makes a
    /// stale write fail with a conflict.
    async fn set_finalizers(
        &self,
        name: &str,
        resource_version: Option<&str>,
        finalizers: &[String],
    ) -> Result<(), ReconcileErr>;

    async fn patch_status(
        &self,
        name: &str,
        resource_version: Option<&str>,
        status: &AIChatWorkspaceStatus,
    ) -> Result<(), ReconcileErr>;

    async fn child_exists(&self, child: &ChildResource) -> Result<bool, ReconcileErr>;

    /// Creates `child`; an `AlreadyExists` answer counts as success.
    async fn create_child(&self, child: &ChildResource) -> Result<(), ReconcileErr>;

    /// Deletes a namespace; an absent namespace counts as deleted.
    async fn delete_namespace(&self, name: &str) -> Result<(), ReconcileErr>;

    async fn stateful_set_ready_replicas(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<i32, ReconcileErr>;

    async fn get_config_map(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, ReconcileErr>;
}

#[derive(Clone)]
pub struct KubeWorkspaceClient {
    client: Client,
    field_manager: String,
}

impl KubeWorkspaceClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            field_manager: super::CONTROLLER_NAME.to_string(),
        }
    }

    fn namespaced<K>(&self, ns: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), ns)
    }

    fn patch_params(&self) -> PatchParams {
        PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

fn child_namespace(child: &ChildResource) -> Result<&str, ReconcileErr> {
    child.namespace().ok_or_else(|| {
        ReconcileErr::Internal(format!(
            "{} {} has no namespace",
            child.kind(),
            child.name()
        ))
    })
}

fn with_resource_version(mut patch: Value, resource_version: Option<&str>) -> Value {
    if let (Some(rv), Some(meta)) = (resource_version, patch.get_mut("metadata")) {
        meta["resourceVersion"] = Value::String(rv.to_string());
    }
    patch
}

/// A namespace that is gone (404) or already terminating (409) counts as
/// deleted.
fn namespace_delete_outcome(
    name: &str,
    res: Result<(), kube::Error>,
) -> Result<(), ReconcileErr> {
    match res {
        Ok(()) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!(namespace = %name, "namespace already gone");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            debug!(namespace = %name, "namespace already terminating");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn exists<K>(api: Api<K>, name: &str) -> Result<bool, ReconcileErr>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    Ok(api.get_opt(name).await?.is_some())
}

async fn create<K>(api: Api<K>, obj: &K) -> Result<(), ReconcileErr>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    match api.create(&PostParams::default(), obj).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            debug!(reason = %ae.reason, "child already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl WorkspaceKube for KubeWorkspaceClient {
    async fn get_workspace(
        &self,
        name: &str,
    ) -> Result<Option<AIChatWorkspace>, ReconcileErr> {
        let api: Api<AIChatWorkspace> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn set_finalizers(
        &self,
        name: &str,
        resource_version: Option<&str>,
        finalizers: &[String],
    ) -> Result<(), ReconcileErr> {
        let api: Api<AIChatWorkspace> = Api::all(self.client.clone());
        let patch = with_resource_version(
            json!({ "metadata": { "finalizers": finalizers } }),
            resource_version,
        );
        api.patch(name, &self.patch_params(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_status(
        &self,
        name: &str,
        resource_version: Option<&str>,
        status: &AIChatWorkspaceStatus,
    ) -> Result<(), ReconcileErr> {
        let api: Api<AIChatWorkspace> = Api::all(self.client.clone());
        let patch = with_resource_version(
            json!({ "metadata": {}, "status": serde_json::to_value(status)? }),
            resource_version,
        );
        api.patch_status(name, &self.patch_params(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn child_exists(&self, child: &ChildResource) -> Result<bool, ReconcileErr> {
        let name = child.name();
        match child {
            ChildResource::Namespace(_) => {
                exists(Api::<Namespace>::all(self.client.clone()), name).await
            }
            ChildResource::ResourceQuota(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::PersistentVolumeClaim(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::ServiceAccount(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::StatefulSet(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::Service(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::Deployment(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::Ingress(o) => {
                exists(self.namespaced_like(o, child)?, name).await
            }
            ChildResource::ScaledObject(_) => {
                let api = Api::<DynamicObject>::namespaced_with(
                    self.client.clone(),
                    child_namespace(child)?,
                    &http_scaled_object_resource(),
                );
                exists(api, name).await
            }
        }
    }

    async fn create_child(&self, child: &ChildResource) -> Result<(), ReconcileErr> {
        match child {
            ChildResource::Namespace(o) => {
                create(Api::<Namespace>::all(self.client.clone()), o).await
            }
            ChildResource::ResourceQuota(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::PersistentVolumeClaim(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::ServiceAccount(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::StatefulSet(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::Service(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::Deployment(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::Ingress(o) => {
                create(self.namespaced_like(o, child)?, o).await
            }
            ChildResource::ScaledObject(o) => {
                let api = Api::<DynamicObject>::namespaced_with(
                    self.client.clone(),
                    child_namespace(child)?,
                    &http_scaled_object_resource(),
                );
                create(api, o).await
            }
        }
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ReconcileErr> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let res = api.delete(name, &DeleteParams::background()).await;
        namespace_delete_outcome(name, res.map(|_| ()))
    }

    async fn stateful_set_ready_replicas(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<i32, ReconcileErr> {
        let api: Api<StatefulSet> = self.namespaced(ns);
        Ok(api
            .get_opt(name)
            .await?
            .and_then(|s| s.status)
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0))
    }

    async fn get_config_map(
        &self,
        ns: &str,
        name: &str,
    ) -> Result<Option<ConfigMap>, ReconcileErr> {
        let api: Api<ConfigMap> = self.namespaced(ns);
        Ok(api.get_opt(name).await?)
    }
}

impl KubeWorkspaceClient {
    /// Namespaced API for the kind of `_obj`, in the namespace of `child`.
    fn namespaced_like<K>(
        &self,
        _obj: &K,
        child: &ChildResource,
    ) -> Result<Api<K>, ReconcileErr>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Ok(self.namespaced(child_namespace(child)?))
    }
}
