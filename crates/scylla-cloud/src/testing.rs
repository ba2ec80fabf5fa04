//! Test support: a scripted in-memory [`ClusterApi`] and sample fixtures

use crate::catalog::Catalog;
use crate::client::ClusterApi;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    AsyncRequest, CREATE_CLUSTER_REQUEST, CloudProviderInfo, Cluster, ClusterCreateRequest,
    Datacenter, Instance, Node, Region, ScyllaVersion,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub const SAMPLE_CLUSTER_ID: i64 = 42;
pub const SAMPLE_REQUEST_ID: i64 = 100;
pub const SAMPLE_DATACENTER_ID: i64 = 7;

pub fn sample_catalog() -> Catalog {
    let aws = CloudProviderInfo {
        id: 1,
        name: "AWS".to_string(),
    };
    let regions = vec![
        Region {
            id: 10,
            external_id: "us-east-1".to_string(),
            cloud_provider_id: aws.id,
        },
        Region {
            id: 11,
            external_id: "eu-west-1".to_string(),
            cloud_provider_id: aws.id,
        },
    ];
    let instances = vec![
        Instance {
            id: 20,
            external_id: "i3.large".to_string(),
            cloud_provider_id: aws.id,
        },
        Instance {
            id: 21,
            external_id: "i3.xlarge".to_string(),
            cloud_provider_id: aws.id,
        },
    ];
    let versions = vec![
        ScyllaVersion {
            version_id: 30,
            version: "5.1.0".to_string(),
            description: "Scylla 5.1".to_string(),
        },
        ScyllaVersion {
            version_id: 31,
            version: "5.2.0".to_string(),
            description: "Scylla 5.2".to_string(),
        },
    ];

    // The fixture is static and always lists its default version.
    match Catalog::new(aws, regions, instances, versions, 31) {
        Ok(catalog) => catalog,
        Err(e) => unreachable!("sample catalog is consistent: {e}"),
    }
}

fn datacenter(id: i64) -> Datacenter {
    Datacenter {
        id,
        name: "AWS_US_EAST_1".to_string(),
        cidr_block: "172.31.0.0/16".to_string(),
        instance_id: 20,
        region_id: 10,
    }
}

/// A healthy three-node cluster in us-east-1 matching [`sample_catalog`]
pub fn sample_cluster() -> Cluster {
    Cluster {
        id: SAMPLE_CLUSTER_ID,
        cluster_name: "orders".to_string(),
        status: "ACTIVE".to_string(),
        region: Region {
            id: 10,
            external_id: "us-east-1".to_string(),
            cloud_provider_id: 1,
        },
        nodes: (1..=3)
            .map(|id| Node {
                id,
                status: "ACTIVE".to_string(),
                private_ip: Some(format!("172.31.0.{}", id)),
                public_ip: None,
            })
            .collect(),
        user_api_interface: "CQL".to_string(),
        datacenter: datacenter(SAMPLE_DATACENTER_ID),
        datacenters: vec![datacenter(SAMPLE_DATACENTER_ID)],
        scylla_version: ScyllaVersion {
            version_id: 31,
            version: "5.2.0".to_string(),
            description: String::new(),
        },
        broadcast_type: "PRIVATE".to_string(),
        dns: true,
    }
}

pub fn async_request(id: i64, status: &str) -> AsyncRequest {
    AsyncRequest {
        id,
        cluster_id: SAMPLE_CLUSTER_ID,
        request_type: CREATE_CLUSTER_REQUEST.to_string(),
        status: status.to_string(),
        user_friendly_error: String::new(),
    }
}

/// Number of calls made to each [`ClusterApi`] operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_cluster: usize,
    pub get_cluster: usize,
    pub get_cluster_request: usize,
    pub list_cluster_requests: usize,
    pub delete_cluster: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.create_cluster
            + self.get_cluster
            + self.get_cluster_request
            + self.list_cluster_requests
            + self.delete_cluster
    }
}

#[derive(Debug)]
struct MockState {
    statuses: VecDeque<String>,
    last_status: String,
    poll_failure: Option<String>,
    create_response: AsyncRequest,
    create_failure: Option<String>,
    cluster: Cluster,
    listed: Vec<AsyncRequest>,
    delete_response: AsyncRequest,
    calls: CallCounts,
    created: Vec<ClusterCreateRequest>,
    deleted: Vec<(i64, String)>,
}

/// Scripted [`ClusterApi`]
///
/// Request polls consume the scripted status list in order and keep
/// returning the last status once it runs out.
#[derive(Debug)]
pub struct MockClusterApi {
    state: Mutex<MockState>,
}

impl Default for MockClusterApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                statuses: VecDeque::new(),
                last_status: "COMPLETED".to_string(),
                poll_failure: None,
                create_response: async_request(SAMPLE_REQUEST_ID, "QUEUED"),
                create_failure: None,
                cluster: sample_cluster(),
                listed: vec![async_request(SAMPLE_REQUEST_ID, "COMPLETED")],
                delete_response: AsyncRequest {
                    request_type: "DELETE_CLUSTER".to_string(),
                    ..async_request(SAMPLE_REQUEST_ID + 1, "QUEUED")
                },
                calls: CallCounts::default(),
                created: Vec::new(),
                deleted: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_request_statuses(self, statuses: &[&str]) -> Self {
        {
            let mut state = self.state();
            state.statuses = statuses.iter().map(|s| s.to_string()).collect();
            if let Some(last) = statuses.last() {
                state.last_status = last.to_string();
            }
        }
        self
    }

    /// Every request poll fails with a 503 carrying `message`
    pub fn with_poll_failure(self, message: &str) -> Self {
        self.state().poll_failure = Some(message.to_string());
        self
    }

    pub fn with_create_response(self, response: AsyncRequest) -> Self {
        self.state().create_response = response;
        self
    }

    pub fn with_create_failure(self, message: &str) -> Self {
        self.state().create_failure = Some(message.to_string());
        self
    }

    pub fn with_cluster(self, cluster: Cluster) -> Self {
        self.state().cluster = cluster;
        self
    }

    pub fn with_listed_requests(self, requests: Vec<AsyncRequest>) -> Self {
        self.state().listed = requests;
        self
    }

    pub fn with_delete_response(self, response: AsyncRequest) -> Self {
        self.state().delete_response = response;
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn created_requests(&self) -> Vec<ClusterCreateRequest> {
        self.state().created.clone()
    }

    pub fn deleted_clusters(&self) -> Vec<(i64, String)> {
        self.state().deleted.clone()
    }
}

#[async_trait]
impl ClusterApi for MockClusterApi {
    async fn create_cluster(&self, request: &ClusterCreateRequest) -> ApiResult<AsyncRequest> {
        let mut state = self.state();
        state.calls.create_cluster += 1;
        if let Some(message) = &state.create_failure {
            return Err(ApiError::Status {
                status: 400,
                message: message.clone(),
            });
        }
        state.created.push(request.clone());
        Ok(state.create_response.clone())
    }

    async fn get_cluster(&self, _cluster_id: i64) -> ApiResult<Cluster> {
        let mut state = self.state();
        state.calls.get_cluster += 1;
        Ok(state.cluster.clone())
    }

    async fn get_cluster_request(&self, request_id: i64) -> ApiResult<AsyncRequest> {
        let mut state = self.state();
        state.calls.get_cluster_request += 1;
        if let Some(message) = &state.poll_failure {
            return Err(ApiError::Status {
                status: 503,
                message: message.clone(),
            });
        }
        let status = match state.statuses.pop_front() {
            Some(status) => status,
            None => state.last_status.clone(),
        };
        Ok(async_request(request_id, &status))
    }

    async fn list_cluster_requests(
        &self,
        cluster_id: i64,
        request_type: &str,
    ) -> ApiResult<Vec<AsyncRequest>> {
        let mut state = self.state();
        state.calls.list_cluster_requests += 1;
        Ok(state
            .listed
            .iter()
            .filter(|r| r.cluster_id == cluster_id && r.request_type == request_type)
            .cloned()
            .collect())
    }

    async fn delete_cluster(&self, cluster_id: i64, name: &str) -> ApiResult<AsyncRequest> {
        let mut state = self.state();
        state.calls.delete_cluster += 1;
        state.deleted.push((cluster_id, name.to_string()));
        Ok(state.delete_response.clone())
    }
}
