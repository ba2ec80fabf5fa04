//! ScyllaDB Cloud cluster lifecycle
//!
//! This crate manages ScyllaDB Cloud clusters declaratively: a declared
//! record is resolved against the control plane's catalog, submitted as an
//! asynchronous request, awaited, and the observed cluster is projected back
//! onto the record.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                scylla-cloud CLI                  │
//! │       (plan / apply / refresh / destroy)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 scylla-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │     ClusterResource (create/read/delete)  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │  Resolver  │ │   Waiter   │ │ Projector  │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │ Plan/Actions │  │  State Mgmt  │             │
//! │  └──────────────┘  └──────────────┘             │
//! └─────────────────┬───────────────────────────────┘
//!                   │ trait ClusterApi
//! ┌─────────────────▼───────────────────────────────┐
//! │          HttpClient (ScyllaDB Cloud API)         │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod catalog;
pub mod client;
pub mod error;
pub mod model;
pub mod projector;
pub mod resolver;
pub mod resource;
pub mod schema;
pub mod state;
pub mod waiter;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary, plan};
pub use catalog::Catalog;
pub use client::{ClientConfig, ClusterApi, DEFAULT_ENDPOINT, HttpClient};
pub use error::{ApiError, ApiResult, CloudError, Result};
pub use model::{AsyncRequest, BroadcastType, Cluster, ClusterCreateRequest, RequestStatus};
pub use projector::{PersistedState, Projector};
pub use resolver::{ApiInterface, DesiredSpec, ResolvedCreateRequest, Resolver};
pub use resource::{ClusterResource, Timeouts};
pub use schema::{Attribute, AttributeType, RESOURCE_TYPE, ResourceData, cluster_schema};
pub use state::{GlobalState, ResourceState, StateLock, StateManager};
pub use waiter::{DEFAULT_POLL_INTERVAL, Deadline};
