//! Metadata catalog
//!
//! Immutable lookup tables mapping human-readable names (region, instance
//! type, scylla version) to the identifiers the control plane expects, and
//! back. The catalog is loaded once at bootstrap (see
//! [`HttpClient::load_catalog`](crate::client::HttpClient::load_catalog))
//! and shared by reference with every component that needs it.

use crate::error::{CloudError, Result};
use crate::model::{CloudProviderInfo, Instance, Region, ScyllaVersion};

/// Name and id lookup tables for one cloud provider
#[derive(Debug, Clone)]
pub struct Catalog {
    cloud_provider: CloudProviderInfo,
    regions: Vec<Region>,
    instances: Vec<Instance>,
    versions: Vec<ScyllaVersion>,
    default_version: usize,
}

impl Catalog {
    /// Build a catalog, rejecting a default version that is not listed
    pub fn new(
        cloud_provider: CloudProviderInfo,
        regions: Vec<Region>,
        instances: Vec<Instance>,
        versions: Vec<ScyllaVersion>,
        default_version_id: i64,
    ) -> Result<Self> {
        let default_version = versions
            .iter()
            .position(|v| v.version_id == default_version_id)
            .ok_or_else(|| {
                CloudError::InvalidConfig(format!(
                    "default scylla version id {} is not in the version list",
                    default_version_id
                ))
            })?;

        Ok(Self {
            cloud_provider,
            regions,
            instances,
            versions,
            default_version,
        })
    }

    /// Provider every region and instance belongs to
    pub fn cloud_provider(&self) -> &CloudProviderInfo {
        &self.cloud_provider
    }

    /// Find a region by its provider name, e.g. `us-east-1`
    pub fn region_by_name(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.external_id == name)
    }

    /// Find a region by its control-plane id
    pub fn region_by_id(&self, id: i64) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Find an instance type by its provider name, e.g. `i3.large`
    pub fn instance_by_name(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.external_id == name)
    }

    /// Find an instance type by its control-plane id
    pub fn instance_by_id(&self, id: i64) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Find a scylla version by its version string, e.g. `5.2.0`
    pub fn version_by_name(&self, name: &str) -> Option<&ScyllaVersion> {
        self.versions.iter().find(|v| v.version == name)
    }

    /// Find a scylla version by its control-plane id
    pub fn version_by_id(&self, id: i64) -> Option<&ScyllaVersion> {
        self.versions.iter().find(|v| v.version_id == id)
    }

    /// The version selected when a cluster does not pin one
    pub fn default_version(&self) -> &ScyllaVersion {
        &self.versions[self.default_version]
    }

    /// All regions offered for the provider
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// All instance types offered for the provider
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// All selectable scylla versions
    pub fn versions(&self) -> &[ScyllaVersion] {
        &self.versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(
            CloudProviderInfo {
                id: 1,
                name: "AWS".to_string(),
            },
            vec![Region {
                id: 10,
                external_id: "us-east-1".to_string(),
                cloud_provider_id: 1,
            }],
            vec![Instance {
                id: 20,
                external_id: "i3.large".to_string(),
                cloud_provider_id: 1,
            }],
            vec![
                ScyllaVersion {
                    version_id: 30,
                    version: "5.1.0".to_string(),
                    description: String::new(),
                },
                ScyllaVersion {
                    version_id: 31,
                    version: "5.2.0".to_string(),
                    description: String::new(),
                },
            ],
            31,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_both_directions() {
        let c = catalog();
        assert_eq!(c.region_by_name("us-east-1").map(|r| r.id), Some(10));
        assert_eq!(c.instance_by_id(20).map(|i| i.external_id.as_str()), Some("i3.large"));
        assert_eq!(c.version_by_name("5.1.0").map(|v| v.version_id), Some(30));
        assert!(c.region_by_name("US-EAST-1").is_none());
    }

    #[test]
    fn test_lookup_by_id() {
        let c = catalog();
        assert_eq!(
            c.region_by_id(10).map(|r| r.external_id.as_str()),
            Some("us-east-1")
        );
        assert_eq!(c.version_by_id(30).map(|v| v.version.as_str()), Some("5.1.0"));
        assert!(c.region_by_id(11).is_none());
        assert!(c.version_by_id(99).is_none());
    }

    #[test]
    fn test_default_version() {
        assert_eq!(catalog().default_version().version, "5.2.0");
    }

    #[test]
    fn test_rejects_unlisted_default_version() {
        let err = Catalog::new(CloudProviderInfo::default(), vec![], vec![], vec![], 5).unwrap_err();
        assert!(matches!(err, CloudError::InvalidConfig(_)));
    }
}
