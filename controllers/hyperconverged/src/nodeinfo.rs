//! Cluster topology classification from the node inventory.
//!
//! The eviction-strategy default and the wasp-agent rollout depend on how
//! many schedulable workers exist, so the info is refreshed on every pass.

use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::{Api, Client};

use crate::error::ControllerError;

const LABEL_WORKER: &str = "node-role.kubernetes.io/worker";
const LABEL_CONTROL_PLANE: &str = "node-role.kubernetes.io/control-plane";
const LABEL_MASTER: &str = "node-role.kubernetes.io/master";

/// Snapshot of the cluster topology.
#[derive(Debug, Clone, Default)]
pub struct ClusterInfo {
    /// Schedulable nodes that can run workloads.
    pub schedulable_workers: usize,

    /// Control-plane node count.
    pub control_plane_nodes: usize,
}

impl ClusterInfo {
    /// Classifies a node list.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut info = ClusterInfo::default();

        for node in nodes {
            let labels = node.metadata.labels.clone().unwrap_or_default();
            let unschedulable = node
                .spec
                .as_ref()
                .and_then(|s| s.unschedulable)
                .unwrap_or(false);

            let control_plane =
                labels.contains_key(LABEL_CONTROL_PLANE) || labels.contains_key(LABEL_MASTER);
            if control_plane {
                info.control_plane_nodes += 1;
            }

            // Schedulable control-plane nodes count as workers on compact
            // clusters; a plain worker label does too.
            let worker = labels.contains_key(LABEL_WORKER) || !control_plane;
            if worker && !unschedulable {
                info.schedulable_workers += 1;
            }
        }

        info
    }

    /// Reads the current inventory from the API server.
    pub async fn fetch(client: &Client) -> Result<Self, ControllerError> {
        let nodes: Api<Node> = Api::all(client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        Ok(Self::from_nodes(&list.items))
    }

    /// True when at most one node can run workloads; live migration is then
    /// impossible.
    pub fn is_single_worker(&self) -> bool {
        self.schedulable_workers <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn node(labels: &[(&str, &str)], unschedulable: bool) -> Node {
        let mut n = Node::default();
        n.metadata.labels = Some(
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        );
        n.spec = Some(k8s_openapi::api::core::v1::NodeSpec {
            unschedulable: Some(unschedulable),
            ..Default::default()
        });
        n
    }

    #[test]
    fn multi_worker_cluster_is_not_single_worker() {
        let nodes = vec![
            node(&[(LABEL_CONTROL_PLANE, "")], false),
            node(&[(LABEL_WORKER, "")], false),
            node(&[(LABEL_WORKER, "")], false),
        ];
        let info = ClusterInfo::from_nodes(&nodes);
        assert_eq!(info.schedulable_workers, 2);
        assert_eq!(info.control_plane_nodes, 1);
        assert!(!info.is_single_worker());
    }

    #[test]
    fn cordoned_workers_do_not_count() {
        let nodes = vec![
            node(&[(LABEL_WORKER, "")], false),
            node(&[(LABEL_WORKER, "")], true),
        ];
        let info = ClusterInfo::from_nodes(&nodes);
        assert!(info.is_single_worker());
    }

    #[test]
    fn compact_cluster_counts_schedulable_control_planes() {
        let nodes = vec![
            node(&[(LABEL_CONTROL_PLANE, ""), (LABEL_WORKER, "")], false),
            node(&[(LABEL_MASTER, ""), (LABEL_WORKER, "")], false),
        ];
        let info = ClusterInfo::from_nodes(&nodes);
        assert_eq!(info.schedulable_workers, 2);
        assert_eq!(info.control_plane_nodes, 2);
    }
}
