//! Translation of declared cluster attributes into a create request
//!
//! [`DesiredSpec`] is the typed view of the declared attributes, built once
//! from a [`ResourceData`]. [`Resolver`] maps its human-readable names onto
//! catalog identifiers. Both steps are pure: nothing here talks to the
//! network, so every failure surfaces before a mutating call is issued.

use crate::catalog::Catalog;
use crate::error::{CloudError, Result};
use crate::model::{BroadcastType, ClusterCreateRequest};
use crate::schema::{ResourceData, attr};
use serde::de::DeserializeOwned;

pub const DEFAULT_CIDR_BLOCK: &str = "172.31.0.0/16";
pub const DEFAULT_WRITE_ISOLATION: &str = "only_rmw_uses_lwt";
pub const ACCOUNT_CREDENTIAL_ID: i64 = 1;
pub const REPLICATION_FACTOR: i64 = 3;

/// API interface exposed by the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiInterface {
    #[default]
    Cql,
    Alternator,
}

impl ApiInterface {
    /// Parse the declared value; only `CQL` and `ALTERNATOR` are accepted
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CQL" => Some(ApiInterface::Cql),
            "ALTERNATOR" => Some(ApiInterface::Alternator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiInterface::Cql => "CQL",
            ApiInterface::Alternator => "ALTERNATOR",
        }
    }
}

impl std::fmt::Display for ApiInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared attributes of a cluster, with schema defaults applied
///
/// `cidr_block` and `scylla_version` stay `None` when not declared; the
/// resolver picks their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredSpec {
    pub name: String,
    pub region: String,
    pub node_count: i64,
    pub user_api_interface: ApiInterface,
    pub alternator_write_isolation: String,
    pub node_type: String,
    pub cidr_block: Option<String>,
    pub scylla_version: Option<String>,
    pub enable_vpc_peering: bool,
    pub enable_dns: bool,
}

impl DesiredSpec {
    /// Read and type-check the declared attributes of `data`
    pub fn from_data(data: &ResourceData) -> Result<Self> {
        let node_count: i64 = required(data, attr::NODE_COUNT)?;
        if node_count < 1 {
            return Err(CloudError::InvalidAttribute {
                attribute: attr::NODE_COUNT.to_string(),
                message: format!("must be at least 1, got {}", node_count),
            });
        }

        let user_api_interface = match optional::<String>(data, attr::USER_API_INTERFACE)? {
            Some(value) => ApiInterface::parse(&value)
                .ok_or_else(|| CloudError::unrecognized(attr::USER_API_INTERFACE, value))?,
            None => ApiInterface::default(),
        };

        Ok(Self {
            name: required(data, attr::NAME)?,
            region: required(data, attr::REGION)?,
            node_count,
            user_api_interface,
            alternator_write_isolation: optional(data, attr::ALTERNATOR_WRITE_ISOLATION)?
                .unwrap_or_else(|| DEFAULT_WRITE_ISOLATION.to_string()),
            node_type: required(data, attr::NODE_TYPE)?,
            cidr_block: optional(data, attr::CIDR_BLOCK)?,
            scylla_version: optional(data, attr::SCYLLA_VERSION)?,
            enable_vpc_peering: optional(data, attr::ENABLE_VPC_PEERING)?.unwrap_or(true),
            enable_dns: optional(data, attr::ENABLE_DNS)?.unwrap_or(true),
        })
    }
}

fn optional<T: DeserializeOwned>(data: &ResourceData, key: &str) -> Result<Option<T>> {
    match data.get(key) {
        None => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
            CloudError::InvalidAttribute {
                attribute: key.to_string(),
                message: e.to_string(),
            }
        }),
    }
}

fn required<T: DeserializeOwned>(data: &ResourceData, key: &str) -> Result<T> {
    optional(data, key)?.ok_or_else(|| CloudError::MissingAttribute(key.to_string()))
}

/// Create request ready for submission, plus the defaults it settled on
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCreateRequest {
    pub request: ClusterCreateRequest,
    /// Effective CIDR block, the default when none was declared
    pub cidr_block: String,
    /// Effective scylla version name, the catalog default when none was declared
    pub scylla_version: String,
}

impl ResolvedCreateRequest {
    /// Persist the effective CIDR block and version so later reads are stable
    pub fn write_defaults(&self, data: &mut ResourceData) {
        data.set_attribute(attr::CIDR_BLOCK, self.cidr_block.clone());
        data.set_attribute(attr::SCYLLA_VERSION, self.scylla_version.clone());
    }
}

/// Turns declared names into catalog ids
pub struct Resolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Build the create request, failing on any name the catalog does not list
    ///
    /// Makes no network calls.
    pub fn resolve(&self, spec: &DesiredSpec) -> Result<ResolvedCreateRequest> {
        let region = self
            .catalog
            .region_by_name(&spec.region)
            .ok_or_else(|| CloudError::unrecognized(attr::REGION, spec.region.as_str()))?;

        let instance = self
            .catalog
            .instance_by_name(&spec.node_type)
            .ok_or_else(|| CloudError::unrecognized(attr::NODE_TYPE, spec.node_type.as_str()))?;

        let version = match &spec.scylla_version {
            None => self.catalog.default_version(),
            Some(name) => self
                .catalog
                .version_by_name(name)
                .ok_or_else(|| CloudError::unrecognized(attr::SCYLLA_VERSION, name.as_str()))?,
        };

        let cidr_block = spec
            .cidr_block
            .clone()
            .unwrap_or_else(|| DEFAULT_CIDR_BLOCK.to_string());

        let alternator_write_isolation = match spec.user_api_interface {
            ApiInterface::Alternator => Some(spec.alternator_write_isolation.clone()),
            ApiInterface::Cql => None,
        };

        let request = ClusterCreateRequest {
            account_credential_id: ACCOUNT_CREDENTIAL_ID,
            cluster_name: spec.name.clone(),
            broadcast_type: BroadcastType::for_peering(spec.enable_vpc_peering),
            replication_factor: REPLICATION_FACTOR,
            number_of_nodes: spec.node_count,
            user_api_interface: spec.user_api_interface.to_string(),
            enable_dns_association: spec.enable_dns,
            cidr_block: cidr_block.clone(),
            cloud_provider_id: self.catalog.cloud_provider().id,
            region_id: region.id,
            instance_id: instance.id,
            scylla_version_id: version.version_id,
            alternator_write_isolation,
        };

        Ok(ResolvedCreateRequest {
            request,
            cidr_block,
            scylla_version: version.version.clone(),
        })
    }
}
