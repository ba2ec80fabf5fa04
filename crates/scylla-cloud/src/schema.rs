//! Declared attributes of the `scylla_cluster` resource and the attribute store

use crate::error::{CloudError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const RESOURCE_TYPE: &str = "scylla_cluster";

/// Attribute names, stable as the contract with configuration and state files
pub mod attr {
    pub const CLUSTER_ID: &str = "cluster_id";
    pub const NAME: &str = "name";
    pub const REGION: &str = "region";
    pub const NODE_COUNT: &str = "node_count";
    pub const USER_API_INTERFACE: &str = "user_api_interface";
    pub const ALTERNATOR_WRITE_ISOLATION: &str = "alternator_write_isolation";
    pub const NODE_TYPE: &str = "node_type";
    pub const CIDR_BLOCK: &str = "cidr_block";
    pub const SCYLLA_VERSION: &str = "scylla_version";
    pub const ENABLE_VPC_PEERING: &str = "enable_vpc_peering";
    pub const ENABLE_DNS: &str = "enable_dns";
    pub const REQUEST_ID: &str = "request_id";
    pub const DATACENTER_ID: &str = "datacenter_id";
    pub const DATACENTER: &str = "datacenter";
    pub const STATUS: &str = "status";
}

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Int => write!(f, "int"),
            AttributeType::Bool => write!(f, "bool"),
        }
    }
}

/// Declaration of a single resource attribute
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// A change cannot be applied in place and requires recreation
    pub force_new: bool,
    pub default: Option<Value>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            default: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Whether a user may set this attribute in configuration
    pub fn is_declarable(&self) -> bool {
        self.required || self.optional
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            AttributeType::String => value.is_string(),
            AttributeType::Int => value.is_i64() || value.is_u64(),
            AttributeType::Bool => value.is_boolean(),
        }
    }
}

/// Attribute table of the `scylla_cluster` resource
pub fn cluster_schema() -> Vec<Attribute> {
    use AttributeType::*;

    vec![
        Attribute::new(attr::CLUSTER_ID, Int, "Cluster id").computed(),
        Attribute::new(attr::NAME, String, "Cluster name")
            .required()
            .force_new(),
        Attribute::new(attr::REGION, String, "Region to use")
            .required()
            .force_new(),
        Attribute::new(attr::NODE_COUNT, Int, "Node count")
            .required()
            .force_new(),
        Attribute::new(
            attr::USER_API_INTERFACE,
            String,
            "Type of API interface, either CQL or ALTERNATOR",
        )
        .optional()
        .force_new()
        .default(Value::from("CQL")),
        Attribute::new(
            attr::ALTERNATOR_WRITE_ISOLATION,
            String,
            "Default write isolation policy",
        )
        .optional()
        .force_new()
        .default(Value::from("only_rmw_uses_lwt")),
        Attribute::new(attr::NODE_TYPE, String, "Instance type of a node")
            .required()
            .force_new(),
        Attribute::new(attr::CIDR_BLOCK, String, "IPv4 CIDR of the cluster")
            .optional()
            .computed()
            .force_new(),
        Attribute::new(attr::SCYLLA_VERSION, String, "Scylla version")
            .optional()
            .computed()
            .force_new(),
        Attribute::new(
            attr::ENABLE_VPC_PEERING,
            Bool,
            "Whether to enable VPC peering",
        )
        .optional()
        .force_new()
        .default(Value::from(true)),
        // Not force-new: a change plans an in-place update.
        Attribute::new(
            attr::ENABLE_DNS,
            Bool,
            "Whether to enable CNAME for seed nodes",
        )
        .optional()
        .default(Value::from(true)),
        Attribute::new(attr::REQUEST_ID, Int, "Cluster creation request ID").computed(),
        Attribute::new(attr::DATACENTER_ID, Int, "Cluster datacenter ID").computed(),
        Attribute::new(attr::DATACENTER, String, "Cluster datacenter name").computed(),
        Attribute::new(attr::STATUS, String, "Cluster status").computed(),
    ]
}

/// Attribute store for one resource instance
///
/// Holds both declared and computed attributes plus the resource identity
/// (the stringified cluster id, empty until the cluster exists).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,

    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl ResourceData {
    /// Empty record without an id
    pub fn new() -> Self {
        Self::default()
    }

    /// A record known only by id, as produced by an import
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Stringified cluster id, empty before creation
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Whether the record refers to an existing remote resource
    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    /// Builder form of [`set_attribute`](Self::set_attribute)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set `key`, replacing any previous value
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Raw value of `key`; null counts as unset
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// Whether the attribute holds a non-null value
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Typed value of `key`, `None` when unset or of another type
    pub fn get_attribute<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// All stored attributes in key order
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    /// Check the record against an attribute table
    ///
    /// Unknown attributes and values of the wrong type are rejected, as are
    /// missing required attributes.
    pub fn validate(&self, schema: &[Attribute]) -> Result<()> {
        for (key, value) in &self.attributes {
            let declared = schema.iter().find(|a| a.name == key.as_str()).ok_or_else(|| {
                CloudError::InvalidAttribute {
                    attribute: key.clone(),
                    message: format!("not an attribute of {}", RESOURCE_TYPE),
                }
            })?;

            if !value.is_null() && !declared.accepts(value) {
                return Err(CloudError::InvalidAttribute {
                    attribute: key.clone(),
                    message: format!("expected {}, got {}", declared.kind, value),
                });
            }
        }

        for attribute in schema.iter().filter(|a| a.required) {
            if !self.is_set(attribute.name) {
                return Err(CloudError::MissingAttribute(attribute.name.to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared() -> ResourceData {
        ResourceData::new()
            .with_attribute(attr::NAME, "orders")
            .with_attribute(attr::REGION, "us-east-1")
            .with_attribute(attr::NODE_COUNT, 3)
            .with_attribute(attr::NODE_TYPE, "i3.large")
    }

    #[test]
    fn test_every_attribute_but_dns_is_force_new_or_computed_only() {
        for attribute in cluster_schema() {
            if attribute.name == attr::ENABLE_DNS {
                assert!(!attribute.force_new);
            } else if attribute.is_declarable() {
                assert!(attribute.force_new, "{} should be force-new", attribute.name);
            } else {
                assert!(attribute.computed);
            }
        }
    }

    #[test]
    fn test_validate_accepts_minimal_declaration() {
        declared().validate(&cluster_schema()).unwrap();
    }

    #[test]
    fn test_validate_reports_missing_required() {
        let mut data = declared();
        data.remove_attribute(attr::NODE_TYPE);
        let err = data.validate(&cluster_schema()).unwrap_err();
        assert!(matches!(err, CloudError::MissingAttribute(ref a) if a == "node_type"));
    }

    #[test]
    fn test_validate_rejects_unknown_and_mistyped() {
        let err = declared()
            .with_attribute("replicas", 3)
            .validate(&cluster_schema())
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidAttribute { ref attribute, .. } if attribute == "replicas"));

        let err = declared()
            .with_attribute(attr::NODE_COUNT, "three")
            .validate(&cluster_schema())
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidAttribute { ref attribute, .. } if attribute == "node_count"));
    }

    #[test]
    fn test_null_counts_as_unset() {
        let data = declared().with_attribute(attr::CIDR_BLOCK, Value::Null);
        assert!(!data.is_set(attr::CIDR_BLOCK));
        assert_eq!(data.get_attribute::<String>(attr::CIDR_BLOCK), None);
    }

    #[test]
    fn test_imported_record_has_only_id() {
        let data = ResourceData::imported("42");
        assert!(data.exists());
        assert_eq!(data.attributes().count(), 0);
    }
}
