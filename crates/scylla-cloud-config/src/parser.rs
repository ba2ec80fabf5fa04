//! KDL project file parsing
//!
//! ```kdl
//! provider {
//!     token "..."
//!     timeouts { create "40m"; delete "90m" }
//!     poll-interval "10s"
//! }
//!
//! cluster "orders" {
//!     region "us-east-1"
//!     node-count 3
//!     node-type "i3.large"
//! }
//! ```

use crate::error::{ConfigError, Result};
use kdl::{KdlDocument, KdlNode, KdlValue};
use scylla_cloud::schema::{AttributeType, attr, cluster_schema};
use scylla_cloud::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL, ResourceData, Timeouts};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const TOKEN_ENV: &str = "SCYLLA_CLOUD_TOKEN";

/// Parsed project file
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub provider: ProviderSettings,
    /// Declared clusters keyed by their node label
    pub clusters: BTreeMap<String, ResourceData>,
}

/// Settings of the `provider` node
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub token: Option<String>,
    pub account_id: Option<i64>,
    pub timeouts: Timeouts,
    pub poll_interval: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            account_id: None,
            timeouts: Timeouts::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ProviderSettings {
    /// API token from the file, else from `SCYLLA_CLOUD_TOKEN`
    pub fn token(&self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            endpoint: self.endpoint.clone(),
            token: self.token()?,
            account_id: self.account_id,
        })
    }
}

/// Read and parse a project file
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
    let content = fs::read_to_string(path.as_ref())?;
    tracing::debug!("Parsing {}", path.as_ref().display());
    parse_config_string(&content)
}

pub fn parse_config_string(content: &str) -> Result<ProjectConfig> {
    let doc: KdlDocument = content.parse()?;
    let mut config = ProjectConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "provider" => config.provider = parse_provider(node)?,
            "cluster" => {
                let (label, data) = parse_cluster(node)?;
                if config.clusters.insert(label.clone(), data).is_some() {
                    return Err(ConfigError::InvalidConfig(format!(
                        "cluster {:?} is declared more than once",
                        label
                    )));
                }
            }
            other => {
                return Err(ConfigError::InvalidConfig(format!(
                    "unknown top-level node {:?}",
                    other
                )));
            }
        }
    }

    Ok(config)
}

fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries().first().and_then(|e| e.value().as_string())
}

fn required_string(node: &KdlNode) -> Result<String> {
    first_string(node).map(|s| s.to_string()).ok_or_else(|| {
        ConfigError::InvalidConfig(format!("{} requires a string value", node.name().value()))
    })
}

fn parse_provider(node: &KdlNode) -> Result<ProviderSettings> {
    let mut provider = ProviderSettings::default();

    let Some(children) = node.children() else {
        return Ok(provider);
    };

    for child in children.nodes() {
        match child.name().value() {
            "endpoint" => provider.endpoint = required_string(child)?,
            "token" => provider.token = Some(required_string(child)?),
            "account_id" | "account-id" => {
                let id = child
                    .entries()
                    .first()
                    .and_then(|e| e.value().as_integer())
                    .and_then(|v| i64::try_from(v).ok())
                    .ok_or_else(|| {
                        ConfigError::InvalidConfig("account-id requires an integer".to_string())
                    })?;
                provider.account_id = Some(id);
            }
            "poll_interval" | "poll-interval" => {
                let interval = parse_duration(&required_string(child)?)?;
                if interval.is_zero() {
                    return Err(ConfigError::InvalidConfig(
                        "poll-interval must be greater than zero".to_string(),
                    ));
                }
                provider.poll_interval = interval;
            }
            "timeouts" => {
                if let Some(timeouts) = child.children() {
                    for timeout in timeouts.nodes() {
                        let limit = parse_duration(&required_string(timeout)?)?;
                        match timeout.name().value() {
                            "create" => provider.timeouts.create = limit,
                            "update" => provider.timeouts.update = limit,
                            "delete" => provider.timeouts.delete = limit,
                            other => {
                                return Err(ConfigError::InvalidConfig(format!(
                                    "unknown timeout {:?}",
                                    other
                                )));
                            }
                        }
                    }
                }
            }
            other => {
                return Err(ConfigError::InvalidConfig(format!(
                    "unknown provider setting {:?}",
                    other
                )));
            }
        }
    }

    Ok(provider)
}

/// Parse a `cluster` node into its label and declared attributes
///
/// The label doubles as the cluster name unless `name` is given.
fn parse_cluster(node: &KdlNode) -> Result<(String, ResourceData)> {
    let label = first_string(node)
        .ok_or_else(|| ConfigError::InvalidConfig("cluster requires a name".to_string()))?
        .to_string();

    let schema = cluster_schema();
    let mut data = ResourceData::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().replace('-', "_");
            let attribute = schema
                .iter()
                .find(|a| a.name == key.as_str() && a.is_declarable())
                .ok_or_else(|| ConfigError::UnknownAttribute {
                    cluster: label.clone(),
                    attribute: child.name().value().to_string(),
                })?;

            let value = child.entries().first().map(|e| e.value());
            let invalid = || {
                ConfigError::InvalidConfig(format!(
                    "cluster {:?}: {} expects a {} value",
                    label, attribute.name, attribute.kind
                ))
            };

            match (attribute.kind, value) {
                (AttributeType::String, Some(KdlValue::String(s))) => {
                    data.set_attribute(attribute.name, s.clone());
                }
                (AttributeType::Int, Some(KdlValue::Integer(i))) => {
                    let i = i64::try_from(*i).map_err(|_| invalid())?;
                    data.set_attribute(attribute.name, i);
                }
                (AttributeType::Bool, Some(KdlValue::Bool(b))) => {
                    data.set_attribute(attribute.name, *b);
                }
                _ => return Err(invalid()),
            }
        }
    }

    if !data.is_set(attr::NAME) {
        data.set_attribute(attr::NAME, label.clone());
    }

    Ok((label, data))
}

/// Parse durations such as `10s`, `40m` or `2h`
pub fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = || ConfigError::InvalidDuration(value.to_string());
    let value = value.trim();
    let (unit_at, _) = value.char_indices().last().ok_or_else(invalid)?;
    let (amount, unit) = value.split_at(unit_at);
    let amount: u64 = amount.parse().map_err(|_| invalid())?;

    let scale: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => return Err(invalid()),
    };
    let seconds = amount.checked_mul(scale).ok_or_else(invalid)?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
provider {
    endpoint "https://cloud.example.com/api/v0"
    token "secret"
    account-id 12
    timeouts {
        create "30m"
        delete "2h"
    }
    poll-interval "5s"
}

cluster "orders" {
    region "us-east-1"
    node-count 3
    node-type "i3.large"
    enable_vpc_peering #false
}
"#;

    #[test]
    fn test_parse_provider_settings() {
        let config = parse_config_string(SAMPLE).unwrap();
        let provider = config.provider;
        assert_eq!(provider.endpoint, "https://cloud.example.com/api/v0");
        assert_eq!(provider.token.as_deref(), Some("secret"));
        assert_eq!(provider.account_id, Some(12));
        assert_eq!(provider.timeouts.create, Duration::from_secs(30 * 60));
        assert_eq!(provider.timeouts.update, Duration::from_secs(40 * 60));
        assert_eq!(provider.timeouts.delete, Duration::from_secs(2 * 60 * 60));
        assert_eq!(provider.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_parse_cluster_attributes() {
        let config = parse_config_string(SAMPLE).unwrap();
        let data = &config.clusters["orders"];
        assert_eq!(data.get_attribute::<String>(attr::NAME).as_deref(), Some("orders"));
        assert_eq!(data.get_attribute::<i64>(attr::NODE_COUNT), Some(3));
        assert_eq!(
            data.get_attribute::<String>(attr::NODE_TYPE).as_deref(),
            Some("i3.large")
        );
        assert_eq!(data.get_attribute::<bool>(attr::ENABLE_VPC_PEERING), Some(false));
        assert!(!data.is_set(attr::CIDR_BLOCK));
        assert!(!data.exists());
    }

    #[test]
    fn test_defaults_without_provider_node() {
        let config = parse_config_string("").unwrap();
        assert_eq!(config.provider, ProviderSettings::default());
        assert!(config.clusters.is_empty());
    }

    #[test]
    fn test_explicit_name_overrides_label() {
        let config = parse_config_string(
            r#"cluster "main" { name "orders-prod"; region "us-east-1"; node-count 3; node-type "i3.large" }"#,
        )
        .unwrap();
        assert_eq!(
            config.clusters["main"].get_attribute::<String>(attr::NAME).as_deref(),
            Some("orders-prod")
        );
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let err = parse_config_string(r#"cluster "orders" { replicas 3 }"#).unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownAttribute { ref attribute, .. } if attribute == "replicas")
        );
    }

    #[test]
    fn test_computed_attribute_is_not_declarable() {
        let err = parse_config_string(r#"cluster "orders" { status "ACTIVE" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let err = parse_config_string(r#"cluster "orders" { node-count "three" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn test_duplicate_cluster_is_rejected() {
        let err = parse_config_string("cluster \"a\" {}\ncluster \"a\" {}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("40m").unwrap(), Duration::from_secs(2400));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn test_parse_duration_overflow_is_rejected() {
        let err = parse_duration("9999999999999999999h").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration(_)));
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = parse_config_string(r#"provider { poll-interval "0s" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn test_token_falls_back_to_env() {
        let provider = ProviderSettings::default();
        temp_env::with_var(TOKEN_ENV, Some("from-env"), || {
            assert_eq!(provider.token().unwrap(), "from-env");
        });
        temp_env::with_var_unset(TOKEN_ENV, || {
            assert!(matches!(provider.token(), Err(ConfigError::MissingToken)));
        });
    }

    #[test]
    fn test_file_token_wins_over_env() {
        let provider = ProviderSettings {
            token: Some("from-file".to_string()),
            ..Default::default()
        };
        temp_env::with_var(TOKEN_ENV, Some("from-env"), || {
            let client = provider.client_config().unwrap();
            assert_eq!(client.token, "from-file");
            assert_eq!(client.endpoint, DEFAULT_ENDPOINT);
        });
    }
}
