//! Wire types of the ScyllaDB Cloud control-plane API

use serde::{Deserialize, Serialize};

/// Request type recorded for cluster creation jobs
pub const CREATE_CLUSTER_REQUEST: &str = "CREATE_CLUSTER";

/// Node status counted as a live member of the cluster
pub const NODE_STATUS_ACTIVE: &str = "ACTIVE";

/// Network visibility of the cluster's broadcast addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastType {
    Private,
    Public,
}

impl BroadcastType {
    /// Peering requires private broadcast addresses
    pub fn for_peering(enable_vpc_peering: bool) -> Self {
        if enable_vpc_peering {
            BroadcastType::Private
        } else {
            BroadcastType::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastType::Private => "PRIVATE",
            BroadcastType::Public => "PUBLIC",
        }
    }
}

impl std::fmt::Display for BroadcastType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the create-cluster call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateRequest {
    pub account_credential_id: i64,
    pub cluster_name: String,
    pub broadcast_type: BroadcastType,
    pub replication_factor: i64,
    pub number_of_nodes: i64,
    pub user_api_interface: String,
    pub enable_dns_association: bool,
    pub cidr_block: String,
    pub cloud_provider_id: i64,
    pub region_id: i64,
    pub instance_id: i64,
    pub scylla_version_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternator_write_isolation: Option<String>,
}

/// Asynchronous job record tracked by the control plane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncRequest {
    pub id: i64,
    #[serde(default)]
    pub cluster_id: i64,
    #[serde(default)]
    pub request_type: String,
    pub status: String,
    #[serde(default)]
    pub user_friendly_error: String,
}

impl AsyncRequest {
    /// Parsed form of the raw status string
    pub fn status(&self) -> RequestStatus {
        RequestStatus::parse(&self.status)
    }
}

/// Status of an asynchronous job, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Queued,
    InProgress,
    Completed,
    /// Any label outside the known set, kept verbatim
    Other(String),
}

impl RequestStatus {
    pub fn parse(status: &str) -> Self {
        if status.eq_ignore_ascii_case("QUEUED") {
            RequestStatus::Queued
        } else if status.eq_ignore_ascii_case("IN_PROGRESS") {
            RequestStatus::InProgress
        } else if status.eq_ignore_ascii_case("COMPLETED") {
            RequestStatus::Completed
        } else {
            RequestStatus::Other(status.to_string())
        }
    }

    /// Whether the job is still waiting for or undergoing execution
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Queued | RequestStatus::InProgress)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Queued => write!(f, "QUEUED"),
            RequestStatus::InProgress => write!(f, "IN_PROGRESS"),
            RequestStatus::Completed => write!(f, "COMPLETED"),
            RequestStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Remote cluster snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: i64,
    pub cluster_name: String,
    #[serde(default)]
    pub status: String,
    pub region: Region,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub user_api_interface: String,
    pub datacenter: Datacenter,
    #[serde(default)]
    pub datacenters: Vec<Datacenter>,
    pub scylla_version: ScyllaVersion,
    #[serde(default)]
    pub broadcast_type: String,
    #[serde(default)]
    pub dns: bool,
}

impl Cluster {
    pub fn nodes_by_status<'a>(&'a self, status: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |n| n.status == status)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datacenter {
    pub id: i64,
    pub name: String,
    pub cidr_block: String,
    pub instance_id: i64,
    #[serde(default)]
    pub region_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i64,
    pub external_id: String,
    #[serde(default)]
    pub cloud_provider_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: i64,
    pub external_id: String,
    #[serde(default)]
    pub cloud_provider_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScyllaVersion {
    pub version_id: i64,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProviderInfo {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_is_case_insensitive() {
        assert_eq!(RequestStatus::parse("completed"), RequestStatus::Completed);
        assert_eq!(RequestStatus::parse("In_Progress"), RequestStatus::InProgress);
        assert_eq!(RequestStatus::parse("QUEUED"), RequestStatus::Queued);
        assert_eq!(
            RequestStatus::parse("FAILED"),
            RequestStatus::Other("FAILED".to_string())
        );
        assert!(!RequestStatus::parse("FAILED").is_pending());
    }

    #[test]
    fn test_broadcast_type_follows_peering() {
        assert_eq!(BroadcastType::for_peering(true), BroadcastType::Private);
        assert_eq!(BroadcastType::for_peering(false), BroadcastType::Public);
    }

    #[test]
    fn test_create_request_omits_unset_write_isolation() {
        let req = ClusterCreateRequest {
            account_credential_id: 1,
            cluster_name: "orders".to_string(),
            broadcast_type: BroadcastType::Private,
            replication_factor: 3,
            number_of_nodes: 3,
            user_api_interface: "CQL".to_string(),
            enable_dns_association: true,
            cidr_block: "172.31.0.0/16".to_string(),
            cloud_provider_id: 1,
            region_id: 2,
            instance_id: 3,
            scylla_version_id: 4,
            alternator_write_isolation: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["broadcastType"], "PRIVATE");
        assert_eq!(json["cidrBlock"], "172.31.0.0/16");
        assert!(json.get("alternatorWriteIsolation").is_none());
    }

    #[test]
    fn test_cluster_deserializes_from_api_shape() {
        let json = serde_json::json!({
            "id": 42,
            "clusterName": "orders",
            "status": "ACTIVE",
            "region": { "id": 1, "externalId": "us-east-1" },
            "nodes": [{ "id": 1, "status": "ACTIVE" }],
            "userApiInterface": "CQL",
            "datacenter": { "id": 7, "name": "AWS_US_EAST_1", "cidrBlock": "172.31.0.0/16", "instanceId": 9 },
            "scyllaVersion": { "versionId": 3, "version": "5.2.0" },
            "broadcastType": "PRIVATE",
            "dns": true
        });
        let cluster: Cluster = serde_json::from_value(json).unwrap();
        assert_eq!(cluster.datacenter.cidr_block, "172.31.0.0/16");
        assert!(cluster.datacenters.is_empty());
        assert_eq!(cluster.nodes_by_status(NODE_STATUS_ACTIVE).count(), 1);
    }
}
