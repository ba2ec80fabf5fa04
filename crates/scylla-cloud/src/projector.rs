//! Projection of a remote cluster snapshot onto the declarative record

use crate::catalog::Catalog;
use crate::error::{CloudError, Result};
use crate::model::{BroadcastType, Cluster, NODE_STATUS_ACTIVE};
use crate::schema::{ResourceData, attr};
use serde::{Deserialize, Serialize};

/// Observed attributes committed after a create or read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub cluster_id: i64,
    pub name: String,
    pub region: String,
    pub node_count: i64,
    pub user_api_interface: String,
    pub node_type: String,
    pub cidr_block: String,
    pub scylla_version: String,
    pub enable_vpc_peering: bool,
    pub enable_dns: bool,
    pub request_id: i64,
    pub datacenter_id: i64,
    pub datacenter: String,
    pub status: String,
}

impl PersistedState {
    /// Overwrite the record's identity and observed attributes
    pub fn apply(&self, data: &mut ResourceData) {
        data.set_id(self.cluster_id.to_string());
        data.set_attribute(attr::CLUSTER_ID, self.cluster_id);
        data.set_attribute(attr::NAME, self.name.clone());
        data.set_attribute(attr::REGION, self.region.clone());
        data.set_attribute(attr::NODE_COUNT, self.node_count);
        data.set_attribute(attr::USER_API_INTERFACE, self.user_api_interface.clone());
        data.set_attribute(attr::NODE_TYPE, self.node_type.clone());
        data.set_attribute(attr::CIDR_BLOCK, self.cidr_block.clone());
        data.set_attribute(attr::SCYLLA_VERSION, self.scylla_version.clone());
        data.set_attribute(attr::ENABLE_VPC_PEERING, self.enable_vpc_peering);
        data.set_attribute(attr::ENABLE_DNS, self.enable_dns);
        data.set_attribute(attr::REQUEST_ID, self.request_id);
        data.set_attribute(attr::DATACENTER_ID, self.datacenter_id);
        data.set_attribute(attr::DATACENTER, self.datacenter.clone());
        data.set_attribute(attr::STATUS, self.status.clone());
    }
}

/// Maps remote clusters back onto the record shape
pub struct Projector<'a> {
    catalog: &'a Catalog,
}

impl<'a> Projector<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Map `cluster` onto the record shape; `request_id` is the creation request
    pub fn project(&self, cluster: &Cluster, request_id: i64) -> Result<PersistedState> {
        if cluster.datacenters.len() > 1 {
            return Err(CloudError::MultipleDatacenters(cluster.datacenters.len()));
        }

        let node_type = self
            .catalog
            .instance_by_id(cluster.datacenter.instance_id)
            .ok_or(CloudError::UnknownInstance(cluster.datacenter.instance_id))?;

        Ok(PersistedState {
            cluster_id: cluster.id,
            name: cluster.cluster_name.clone(),
            region: cluster.region.external_id.clone(),
            node_count: cluster.nodes_by_status(NODE_STATUS_ACTIVE).count() as i64,
            user_api_interface: cluster.user_api_interface.clone(),
            node_type: node_type.external_id.clone(),
            cidr_block: cluster.datacenter.cidr_block.clone(),
            scylla_version: cluster.scylla_version.version.clone(),
            enable_vpc_peering: !cluster
                .broadcast_type
                .eq_ignore_ascii_case(BroadcastType::Public.as_str()),
            enable_dns: cluster.dns,
            request_id,
            datacenter_id: cluster.datacenter.id,
            datacenter: cluster.datacenter.name.clone(),
            status: cluster.status.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use crate::testing::{sample_catalog, sample_cluster};

    fn project(cluster: &Cluster) -> Result<PersistedState> {
        Projector::new(&sample_catalog()).project(cluster, 100)
    }

    #[test]
    fn test_projects_direct_fields() {
        let state = project(&sample_cluster()).unwrap();
        assert_eq!(state.cluster_id, 42);
        assert_eq!(state.name, "orders");
        assert_eq!(state.region, "us-east-1");
        assert_eq!(state.node_count, 3);
        assert_eq!(state.node_type, "i3.large");
        assert_eq!(state.cidr_block, "172.31.0.0/16");
        assert_eq!(state.scylla_version, "5.2.0");
        assert!(state.enable_vpc_peering);
        assert!(state.enable_dns);
        assert_eq!(state.request_id, 100);
        assert_eq!(state.datacenter, "AWS_US_EAST_1");
        assert_eq!(state.status, "ACTIVE");
    }

    #[test]
    fn test_rejects_multiple_datacenters() {
        let mut cluster = sample_cluster();
        cluster.datacenters.push(cluster.datacenter.clone());
        let err = project(&cluster).unwrap_err();
        assert!(matches!(err, CloudError::MultipleDatacenters(2)));
    }

    #[test]
    fn test_counts_only_active_nodes() {
        let mut cluster = sample_cluster();
        cluster.nodes.extend((4..=5).map(|id| Node {
            id,
            status: "PROVISIONING".to_string(),
            ..Default::default()
        }));
        assert_eq!(project(&cluster).unwrap().node_count, 3);
    }

    #[test]
    fn test_peering_is_inverse_of_public_broadcast() {
        let mut cluster = sample_cluster();
        for (broadcast, peering) in [("PUBLIC", false), ("public", false), ("PRIVATE", true)] {
            cluster.broadcast_type = broadcast.to_string();
            assert_eq!(project(&cluster).unwrap().enable_vpc_peering, peering);
        }
    }

    #[test]
    fn test_unknown_instance_is_an_error() {
        let mut cluster = sample_cluster();
        cluster.datacenter.instance_id = 999;
        let err = project(&cluster).unwrap_err();
        assert!(matches!(err, CloudError::UnknownInstance(999)));
    }

    #[test]
    fn test_apply_sets_identity_and_attributes() {
        let mut data = ResourceData::new();
        project(&sample_cluster()).unwrap().apply(&mut data);
        assert_eq!(data.id(), "42");
        assert_eq!(data.get_attribute::<i64>(attr::REQUEST_ID), Some(100));
        assert_eq!(data.get_attribute::<i64>(attr::DATACENTER_ID), Some(7));
        assert_eq!(data.get_attribute::<bool>(attr::ENABLE_VPC_PEERING), Some(true));
    }
}
