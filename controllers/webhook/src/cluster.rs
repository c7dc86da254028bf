//! Cluster lookups the admission handlers depend on.
//!
//! Both lookups sit behind a trait so the handlers stay testable without an
//! API server: deletion validation needs to know whether virtualization
//! workloads still exist, and defaulting needs the worker topology.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, DynamicObject, ListParams};
use kube::core::{ApiResource, GroupVersionKind};
use kube::Client;

const LABEL_WORKER: &str = "node-role.kubernetes.io/worker";
const LABEL_CONTROL_PLANE: &str = "node-role.kubernetes.io/control-plane";
const LABEL_MASTER: &str = "node-role.kubernetes.io/master";

/// Read-only view of the cluster state consulted during admission.
#[async_trait]
pub trait ClusterView: Send + Sync {
    /// True when at least one VirtualMachineInstance exists in any namespace.
    async fn workloads_exist(&self) -> Result<bool, kube::Error>;

    /// True when at most one node can run workloads.
    async fn single_worker_node(&self) -> Result<bool, kube::Error>;
}

/// Live implementation backed by the API server.
pub struct KubeClusterView {
    client: Client,
}

impl KubeClusterView {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterView for KubeClusterView {
    async fn workloads_exist(&self) -> Result<bool, kube::Error> {
        let gvk = GroupVersionKind::gvk("kubevirt.io", "v1", "VirtualMachineInstance");
        let ar = ApiResource::from_gvk_with_plural(&gvk, "virtualmachineinstances");
        let vmis: Api<DynamicObject> = Api::all_with(self.client.clone(), &ar);
        let list = vmis.list(&ListParams::default().limit(1)).await?;
        Ok(!list.items.is_empty())
    }

    async fn single_worker_node(&self) -> Result<bool, kube::Error> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;

        let mut workers = 0;
        for node in &list.items {
            let labels = node.metadata.labels.clone().unwrap_or_default();
            let unschedulable = node
                .spec
                .as_ref()
                .and_then(|s| s.unschedulable)
                .unwrap_or(false);

            let control_plane =
                labels.contains_key(LABEL_CONTROL_PLANE) || labels.contains_key(LABEL_MASTER);
            let worker = labels.contains_key(LABEL_WORKER) || !control_plane;
            if worker && !unschedulable {
                workers += 1;
            }
        }

        Ok(workers <= 1)
    }
}

#[cfg(test)]
pub mod mock {
    //! Canned cluster view for handler tests.

    use super::*;

    pub struct MockClusterView {
        pub workloads: bool,
        pub single_worker: bool,
    }

    #[async_trait]
    impl ClusterView for MockClusterView {
        async fn workloads_exist(&self) -> Result<bool, kube::Error> {
            Ok(self.workloads)
        }

        async fn single_worker_node(&self) -> Result<bool, kube::Error> {
            Ok(self.single_worker)
        }
    }
}
