//! Lifecycle of the `scylla_cluster` resource
//!
//! ```text
//! absent ──create──▶ creating ──submitted──▶ polling ──completed──▶ active
//!                                                                     │
//!                                        absent ◀──accepted── deleting┘
//! ```
//!
//! Clusters are immutable once created, so there is no update transition:
//! [`ClusterResource::update`] always fails without contacting the API.

use crate::catalog::Catalog;
use crate::client::ClusterApi;
use crate::error::{CloudError, Result};
use crate::model::{CREATE_CLUSTER_REQUEST, RequestStatus};
use crate::projector::Projector;
use crate::resolver::{DesiredSpec, Resolver};
use crate::schema::{ResourceData, attr};
use crate::waiter::{
    DEFAULT_POLL_INTERVAL, Deadline, bounded, check_poll_interval, wait_for_request,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_secs(40 * 60);
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(90 * 60);

/// Operation ceilings; read shares the create ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_CREATE_TIMEOUT,
            update: DEFAULT_UPDATE_TIMEOUT,
            delete: DEFAULT_DELETE_TIMEOUT,
        }
    }
}

/// Create, read, update and delete entry points for one cluster record
pub struct ClusterResource {
    api: Arc<dyn ClusterApi>,
    catalog: Arc<Catalog>,
    timeouts: Timeouts,
    poll_interval: Duration,
}

impl ClusterResource {
    pub fn new(api: Arc<dyn ClusterApi>, catalog: Arc<Catalog>) -> Self {
        Self {
            api,
            catalog,
            timeouts: Timeouts::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Create the cluster declared in `data` and commit its observed state
    ///
    /// The cluster id and request id are written to `data` as soon as the
    /// submission is accepted, so a failed or interrupted wait still leaves a
    /// record that a later [`read`](Self::read) can resume from.
    pub async fn create(&self, data: &mut ResourceData, cancel: &CancellationToken) -> Result<()> {
        let spec = DesiredSpec::from_data(data)?;
        let resolved = Resolver::new(&self.catalog).resolve(&spec)?;
        check_poll_interval(self.poll_interval)?;
        let deadline = Deadline::after(self.timeouts.create)?;
        resolved.write_defaults(data);

        tracing::info!(name = %spec.name, region = %spec.region, "Creating cluster");
        let submitted = bounded(
            "creating cluster",
            deadline,
            cancel,
            self.api.create_cluster(&resolved.request),
        )
        .await?
        .map_err(CloudError::remote("creating cluster"))?;

        data.set_id(submitted.cluster_id.to_string());
        data.set_attribute(attr::CLUSTER_ID, submitted.cluster_id);
        data.set_attribute(attr::REQUEST_ID, submitted.id);
        tracing::info!(
            cluster_id = submitted.cluster_id,
            request_id = submitted.id,
            "Cluster creation submitted"
        );

        wait_for_request(
            self.api.as_ref(),
            submitted.id,
            self.poll_interval,
            deadline,
            cancel,
        )
        .await?;

        let cluster = bounded(
            "reading cluster",
            deadline,
            cancel,
            self.api.get_cluster(submitted.cluster_id),
        )
        .await?
        .map_err(CloudError::remote("reading cluster"))?;

        data.set_attribute(attr::DATACENTER_ID, cluster.datacenter.id);

        Projector::new(&self.catalog)
            .project(&cluster, submitted.id)?
            .apply(data);

        tracing::info!(cluster_id = cluster.id, status = %cluster.status, "Cluster created");
        Ok(())
    }

    /// Refresh `data` from the control plane
    ///
    /// The creation request is looked up again on every read rather than
    /// taken from the record. An unfinished creation is waited for first.
    pub async fn read(&self, data: &mut ResourceData, cancel: &CancellationToken) -> Result<()> {
        let cluster_id = parse_id(data)?;
        check_poll_interval(self.poll_interval)?;
        let deadline = Deadline::after(self.timeouts.create)?;

        let requests = bounded(
            "reading cluster request",
            deadline,
            cancel,
            self.api
                .list_cluster_requests(cluster_id, CREATE_CLUSTER_REQUEST),
        )
        .await?
        .map_err(CloudError::remote("reading cluster request"))?;

        let count = requests.len();
        let request = match <[_; 1]>::try_from(requests) {
            Ok([request]) => request,
            Err(_) => {
                return Err(CloudError::UnexpectedRequestCount {
                    kind: CREATE_CLUSTER_REQUEST.to_string(),
                    count,
                });
            }
        };

        if request.status() != RequestStatus::Completed {
            tracing::info!(
                cluster_id,
                request_id = request.id,
                status = %request.status,
                "Resuming wait for cluster creation"
            );
            wait_for_request(
                self.api.as_ref(),
                request.id,
                self.poll_interval,
                deadline,
                cancel,
            )
            .await?;
        }

        let cluster = bounded(
            "reading cluster",
            deadline,
            cancel,
            self.api.get_cluster(cluster_id),
        )
        .await?
        .map_err(CloudError::remote("reading cluster"))?;

        Projector::new(&self.catalog)
            .project(&cluster, request.id)?
            .apply(data);

        tracing::debug!(cluster_id, status = %cluster.status, "Cluster read");
        Ok(())
    }

    /// Always fails: the control plane offers no way to modify a cluster
    pub fn update(&self, _data: &ResourceData) -> Result<()> {
        Err(CloudError::UpdateNotSupported)
    }

    /// Submit deletion of the cluster recorded in `data`
    ///
    /// Success means the control plane accepted the request (queued or in
    /// progress); completion is not awaited.
    pub async fn delete(&self, data: &ResourceData, cancel: &CancellationToken) -> Result<()> {
        let cluster_id = parse_id(data)?;
        let name: String = data
            .get_attribute(attr::NAME)
            .ok_or_else(|| CloudError::MissingAttribute(attr::NAME.to_string()))?;

        let deadline = Deadline::after(self.timeouts.delete)?;

        tracing::info!(cluster_id, name = %name, "Deleting cluster");
        let response = bounded(
            "deleting cluster",
            deadline,
            cancel,
            self.api.delete_cluster(cluster_id, &name),
        )
        .await?
        .map_err(CloudError::remote("deleting cluster"))?;

        if !response.status().is_pending() {
            return Err(CloudError::DeleteRejected(response.user_friendly_error));
        }

        tracing::info!(
            cluster_id,
            request_id = response.id,
            status = %response.status,
            "Cluster deletion accepted"
        );
        Ok(())
    }
}

fn parse_id(data: &ResourceData) -> Result<i64> {
    data.id()
        .parse()
        .map_err(|_| CloudError::InvalidId(data.id().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClusterApi, sample_catalog};

    fn resource(api: Arc<MockClusterApi>) -> ClusterResource {
        ClusterResource::new(api, Arc::new(sample_catalog()))
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.create, Duration::from_secs(2400));
        assert_eq!(timeouts.update, Duration::from_secs(2400));
        assert_eq!(timeouts.delete, Duration::from_secs(5400));
    }

    #[test]
    fn test_update_is_always_rejected_without_calls() {
        let api = Arc::new(MockClusterApi::new());
        let resource = resource(api.clone());

        let data = ResourceData::imported("42").with_attribute(attr::ENABLE_DNS, false);
        let err = resource.update(&data).unwrap_err();

        assert!(matches!(err, CloudError::UpdateNotSupported));
        assert_eq!(api.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_read_rejects_non_numeric_id() {
        let api = Arc::new(MockClusterApi::new());
        let mut data = ResourceData::imported("not-a-number");
        let err = resource(api.clone())
            .read(&mut data, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidId(_)));
        assert_eq!(api.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_delete_requires_recorded_name() {
        let api = Arc::new(MockClusterApi::new());
        let data = ResourceData::imported("42");
        let err = resource(api.clone())
            .delete(&data, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::MissingAttribute(ref a) if a == "name"));
        assert_eq!(api.calls().delete_cluster, 0);
    }

    #[tokio::test]
    async fn test_zero_poll_interval_fails_before_submission() {
        let api = Arc::new(MockClusterApi::new());
        let mut data = ResourceData::new()
            .with_attribute(attr::NAME, "orders")
            .with_attribute(attr::REGION, "us-east-1")
            .with_attribute(attr::NODE_COUNT, 3)
            .with_attribute(attr::NODE_TYPE, "i3.large");

        let err = resource(api.clone())
            .with_poll_interval(Duration::ZERO)
            .create(&mut data, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::InvalidConfig(_)));
        assert_eq!(api.calls().total(), 0);
        assert!(!data.exists());
    }

    #[tokio::test]
    async fn test_out_of_range_timeout_fails_before_submission() {
        let api = Arc::new(MockClusterApi::new());
        let data = ResourceData::imported("42").with_attribute(attr::NAME, "orders");

        let err = resource(api.clone())
            .with_timeouts(Timeouts {
                delete: Duration::MAX,
                ..Timeouts::default()
            })
            .delete(&data, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::InvalidConfig(_)));
        assert_eq!(api.calls().total(), 0);
    }
}
