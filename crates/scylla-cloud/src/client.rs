//! ScyllaDB Cloud API client
//!
//! [`ClusterApi`] is the surface the lifecycle code consumes. [`HttpClient`]
//! implements it against the REST API with bearer token authentication and
//! also loads the [`Catalog`] at bootstrap.

use crate::catalog::Catalog;
use crate::error::{ApiError, ApiResult, CloudError, Result};
use crate::model::{
    AsyncRequest, CloudProviderInfo, Cluster, ClusterCreateRequest, Instance, Region,
    ScyllaVersion,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://cloud.scylladb.com/api/v0";

/// Only AWS deployments are managed
const CLOUD_PROVIDER_NAME: &str = "AWS";

/// Remote operations on clusters and their asynchronous requests
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Submit a cluster creation; the returned request carries the new cluster id
    async fn create_cluster(&self, request: &ClusterCreateRequest) -> ApiResult<AsyncRequest>;

    /// Fetch the current state of a cluster
    async fn get_cluster(&self, cluster_id: i64) -> ApiResult<Cluster>;

    /// Fetch one asynchronous request by id
    async fn get_cluster_request(&self, request_id: i64) -> ApiResult<AsyncRequest>;

    /// List the cluster's requests of one type, e.g. `CREATE_CLUSTER`
    async fn list_cluster_requests(
        &self,
        cluster_id: i64,
        request_type: &str,
    ) -> ApiResult<Vec<AsyncRequest>>;

    /// Submit a cluster deletion; the control plane requires the name as confirmation
    async fn delete_cluster(&self, cluster_id: i64, name: &str) -> ApiResult<AsyncRequest>;
}

/// Connection settings for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: String,
    pub account_id: Option<i64>,
}

impl ClientConfig {
    /// Settings for the public endpoint with the default account
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
            account_id: None,
        }
    }
}

/// REST implementation of [`ClusterApi`]
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    account_id: i64,
}

impl HttpClient {
    /// Build a client, resolving the default account when none is configured
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token,
            account_id: config.account_id.unwrap_or_default(),
        };

        if config.account_id.is_none() {
            let account: DefaultAccount = client
                .get("/account/default")
                .await
                .map_err(CloudError::remote("reading default account"))?;
            tracing::debug!(account_id = account.account_id, "Resolved default account");
            client.account_id = account.account_id;
        }

        Ok(client)
    }

    /// Account every cluster call is scoped to
    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    /// Fetch the metadata catalog for AWS deployments
    pub async fn load_catalog(&self) -> Result<Catalog> {
        let providers: CloudProviders = self
            .get("/deployment/cloud-providers")
            .await
            .map_err(CloudError::remote("reading cloud providers"))?;

        let provider = providers
            .cloud_providers
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(CLOUD_PROVIDER_NAME))
            .ok_or_else(|| {
                CloudError::InvalidConfig(format!(
                    "cloud provider {} is not offered by the API",
                    CLOUD_PROVIDER_NAME
                ))
            })?;

        let regions: ProviderRegions = self
            .get(&format!("/deployment/cloud-provider/{}/regions", provider.id))
            .await
            .map_err(CloudError::remote("reading regions"))?;

        let versions: ScyllaVersions = self
            .get("/deployment/scylla-versions")
            .await
            .map_err(CloudError::remote("reading scylla versions"))?;

        tracing::debug!(
            regions = regions.regions.len(),
            instances = regions.instances.len(),
            versions = versions.scylla_versions.len(),
            "Loaded metadata catalog"
        );

        Catalog::new(
            provider,
            regions.regions,
            regions.instances,
            versions.scylla_versions,
            versions.default_scylla_version_id,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn account_path(&self, path: &str) -> String {
        format!("/account/{}{}", self.account_id, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        read_envelope(response).await
    }

    /// GET with query parameters, encoded by reqwest
    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let response = self
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        read_envelope(response).await
    }
}

#[async_trait]
impl ClusterApi for HttpClient {
    async fn create_cluster(&self, request: &ClusterCreateRequest) -> ApiResult<AsyncRequest> {
        self.post(&self.account_path("/cluster"), request).await
    }

    async fn get_cluster(&self, cluster_id: i64) -> ApiResult<Cluster> {
        let body: ClusterBody = self
            .get(&self.account_path(&format!("/cluster/{}", cluster_id)))
            .await?;
        Ok(body.cluster)
    }

    async fn get_cluster_request(&self, request_id: i64) -> ApiResult<AsyncRequest> {
        self.get(&self.account_path(&format!("/cluster/request/{}", request_id)))
            .await
    }

    async fn list_cluster_requests(
        &self,
        cluster_id: i64,
        request_type: &str,
    ) -> ApiResult<Vec<AsyncRequest>> {
        self.get_with_query(
            &self.account_path(&format!("/cluster/{}/request", cluster_id)),
            &[("type", request_type)],
        )
        .await
    }

    async fn delete_cluster(&self, cluster_id: i64, name: &str) -> ApiResult<AsyncRequest> {
        let body = DeleteClusterBody {
            cluster_name: name.to_string(),
        };
        self.post(
            &self.account_path(&format!("/cluster/{}/delete", cluster_id)),
            &body,
        )
        .await
    }
}

/// Decode the `{ "data": ..., "error": ... }` envelope every endpoint returns
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;
    decode_envelope(status.as_u16(), &body)
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> ApiResult<T> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if (200..300).contains(&status) => return Err(ApiError::Decode(e)),
        Err(_) => {
            return Err(ApiError::Status {
                status,
                message: body.trim().to_string(),
            });
        }
    };

    if let Some(message) = envelope.error.filter(|m| !m.is_empty()) {
        return Err(ApiError::Status { status, message });
    }

    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            message: "Unknown error".to_string(),
        });
    }

    envelope.data.ok_or_else(|| ApiError::Status {
        status,
        message: "response carried no data".to_string(),
    })
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultAccount {
    account_id: i64,
}

#[derive(Debug, Deserialize)]
struct ClusterBody {
    cluster: Cluster,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteClusterBody {
    cluster_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudProviders {
    cloud_providers: Vec<CloudProviderInfo>,
}

#[derive(Debug, Deserialize)]
struct ProviderRegions {
    regions: Vec<Region>,
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScyllaVersions {
    default_scylla_version_id: i64,
    scylla_versions: Vec<ScyllaVersion>,
}
