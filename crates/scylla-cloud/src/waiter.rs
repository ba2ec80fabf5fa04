//! Reconciliation loop for asynchronous control-plane requests
//!
//! Mutating calls return immediately with a request record; the actual work
//! happens remotely. [`wait_for_request`] polls that record on a fixed
//! interval until it reports `COMPLETED`.
//!
//! The loop owns no deadline of its own. The enclosing operation passes a
//! [`Deadline`] and a cancellation token, and [`bounded`] enforces both for
//! every call the operation makes.

use crate::client::ClusterApi;
use crate::error::{CloudError, Result};
use crate::model::{AsyncRequest, RequestStatus};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Point in time an operation must finish by, with the limit it was derived from
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    limit: Duration,
}

impl Deadline {
    /// Deadline `limit` from now; a limit past the clock's range is rejected
    pub fn after(limit: Duration) -> Result<Self> {
        let at = Instant::now().checked_add(limit).ok_or_else(|| {
            CloudError::InvalidConfig(format!("timeout {:?} is out of range", limit))
        })?;
        Ok(Self { at, limit })
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

/// Run `future` until it finishes, the deadline passes, or `cancel` fires
pub async fn bounded<F: Future>(
    operation: &'static str,
    deadline: Deadline,
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CloudError::Cancelled),
        result = tokio::time::timeout_at(deadline.at, future) => {
            result.map_err(|_| CloudError::Timeout {
                operation,
                limit: deadline.limit,
            })
        }
    }
}

/// Block until the request reaches `COMPLETED`
///
/// Returns the final request record. A status outside queued / in-progress /
/// completed fails immediately, as does any error from a single poll; neither
/// is retried.
pub async fn wait_for_request(
    api: &dyn ClusterApi,
    request_id: i64,
    interval: Duration,
    deadline: Deadline,
    cancel: &CancellationToken,
) -> Result<AsyncRequest> {
    check_poll_interval(interval)?;
    bounded(
        "waiting for cluster request",
        deadline,
        cancel,
        poll_until_completed(api, request_id, interval),
    )
    .await?
}

/// Reject an interval the ticker cannot run with
pub fn check_poll_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(CloudError::InvalidConfig(
            "poll interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

async fn poll_until_completed(
    api: &dyn ClusterApi,
    request_id: i64,
    interval: Duration,
) -> Result<AsyncRequest> {
    // First poll happens one full interval after submission.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut polls: u32 = 0;
    loop {
        ticker.tick().await;
        polls += 1;

        let request = api
            .get_cluster_request(request_id)
            .await
            .map_err(CloudError::remote("reading cluster request"))?;

        match request.status() {
            RequestStatus::Completed => {
                tracing::info!(request_id, polls, "Cluster request completed");
                return Ok(request);
            }
            status @ (RequestStatus::Queued | RequestStatus::InProgress) => {
                tracing::debug!(request_id, polls, %status, "Cluster request pending");
            }
            RequestStatus::Other(status) => {
                return Err(CloudError::UnrecognizedRequestStatus(status));
            }
        }
    }
}
