//! Planning of cluster changes
//!
//! Compares declared records against committed ones. Attributes marked
//! force-new in the schema cannot change in place, so a difference in any of
//! them plans a replacement.

use crate::schema::{Attribute, RESOURCE_TYPE, ResourceData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Represents a planned action for a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    pub action_type: ActionType,

    pub resource_type: String,

    /// Key of the cluster in configuration and state
    pub resource_id: String,

    pub description: String,

    /// Additional details about the action
    pub details: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new cluster
    Create,
    /// Delete the existing cluster, then create it again
    Replace,
    /// Change in place; always rejected by the control plane
    Update,
    /// Delete a cluster no longer declared
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of applying actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,
    pub failed: Vec<ActionResult>,
    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: String, message: String) {
        self.succeeded.push(ActionResult {
            action_id,
            success: true,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: String, error: String) {
        self.failed.push(ActionResult {
            action_id,
            success: false,
            message: String::new(),
            error: Some(error),
        });
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub replace: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to replace, {} to update, {} to delete, {} unchanged",
            self.create, self.replace, self.update, self.delete, self.no_change
        )
    }
}

/// Compute the actions turning `committed` into `desired`
///
/// Both maps are keyed by the cluster's configuration label.
pub fn plan(
    desired: &BTreeMap<String, ResourceData>,
    committed: &BTreeMap<String, ResourceData>,
    schema: &[Attribute],
) -> Plan {
    let mut actions = Vec::new();

    for (key, declared) in desired {
        let current = committed.get(key).filter(|c| c.exists());

        let Some(current) = current else {
            actions.push(action(
                ActionType::Create,
                key,
                format!("Create cluster {}", key),
                HashMap::new(),
            ));
            continue;
        };

        let changed = changed_attributes(declared, current, schema);
        let mut details = HashMap::new();
        details.insert("cluster_id".to_string(), Value::from(current.id()));

        if changed.is_empty() {
            actions.push(action(
                ActionType::NoOp,
                key,
                format!("Cluster {} is up to date", key),
                details,
            ));
            continue;
        }

        let force_new = changed.iter().any(|name| {
            schema
                .iter()
                .any(|a| a.name == name.as_str() && a.force_new)
        });
        details.insert("changed".to_string(), Value::from(changed.clone()));

        let action_type = if force_new {
            ActionType::Replace
        } else {
            ActionType::Update
        };
        actions.push(action(
            action_type,
            key,
            format!("{} cluster {} ({})", capitalize(action_type), key, changed.join(", ")),
            details,
        ));
    }

    for (key, current) in committed {
        if current.exists() && !desired.contains_key(key) {
            let mut details = HashMap::new();
            details.insert("cluster_id".to_string(), Value::from(current.id()));
            actions.push(action(
                ActionType::Delete,
                key,
                format!("Delete cluster {}", key),
                details,
            ));
        }
    }

    Plan::new(actions)
}

/// Declarable attributes whose declared value differs from the committed one
///
/// Unset attributes compare by their schema default. An undeclared computed
/// attribute without a default accepts whatever was observed.
fn changed_attributes(
    declared: &ResourceData,
    current: &ResourceData,
    schema: &[Attribute],
) -> Vec<String> {
    schema
        .iter()
        .filter(|a| a.is_declarable())
        .filter_map(|a| {
            let wanted = declared.get(a.name).or(a.default.as_ref())?;
            let observed = current.get(a.name).or(a.default.as_ref());
            if observed == Some(wanted) {
                None
            } else {
                Some(a.name.to_string())
            }
        })
        .collect()
}

fn action(
    action_type: ActionType,
    key: &str,
    description: String,
    details: HashMap<String, Value>,
) -> Action {
    Action {
        id: format!("{}-{}", action_type, key),
        action_type,
        resource_type: RESOURCE_TYPE.to_string(),
        resource_id: key.to_string(),
        description,
        details,
    }
}

fn capitalize(action_type: ActionType) -> String {
    let s = action_type.to_string();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::Projector;
    use crate::schema::{attr, cluster_schema};
    use crate::testing::{sample_catalog, sample_cluster};

    fn declared() -> ResourceData {
        ResourceData::new()
            .with_attribute(attr::NAME, "orders")
            .with_attribute(attr::REGION, "us-east-1")
            .with_attribute(attr::NODE_COUNT, 3)
            .with_attribute(attr::NODE_TYPE, "i3.large")
    }

    fn committed() -> ResourceData {
        let mut data = declared();
        Projector::new(&sample_catalog())
            .project(&sample_cluster(), 100)
            .unwrap()
            .apply(&mut data);
        data
    }

    fn plan_one(declared: ResourceData, committed: Option<ResourceData>) -> Plan {
        let desired = BTreeMap::from([("orders".to_string(), declared)]);
        let committed: BTreeMap<_, _> = committed
            .map(|c| ("orders".to_string(), c))
            .into_iter()
            .collect();
        plan(&desired, &committed, &cluster_schema())
    }

    #[test]
    fn test_plan_create_when_not_committed() {
        let plan = plan_one(declared(), None);
        assert!(plan.has_changes);
        assert_eq!(plan.actions[0].action_type, ActionType::Create);
        assert_eq!(plan.actions[0].id, "create-orders");
    }

    #[test]
    fn test_plan_noop_when_matching() {
        let plan = plan_one(declared(), Some(committed()));
        assert!(!plan.has_changes);
        assert_eq!(plan.summary().no_change, 1);
    }

    #[test]
    fn test_plan_replace_on_force_new_change() {
        let plan = plan_one(
            declared().with_attribute(attr::NODE_COUNT, 6),
            Some(committed()),
        );
        let action = &plan.actions[0];
        assert_eq!(action.action_type, ActionType::Replace);
        assert_eq!(action.details["changed"], serde_json::json!(["node_count"]));
    }

    #[test]
    fn test_plan_update_when_only_dns_changes() {
        let plan = plan_one(
            declared().with_attribute(attr::ENABLE_DNS, false),
            Some(committed()),
        );
        assert_eq!(plan.actions[0].action_type, ActionType::Update);
        assert_eq!(plan.actions[0].description, "Update cluster orders (enable_dns)");
    }

    #[test]
    fn test_plan_delete_for_undeclared_cluster() {
        let desired = BTreeMap::new();
        let committed = BTreeMap::from([("orders".to_string(), committed())]);
        let plan = plan(&desired, &committed, &cluster_schema());
        assert_eq!(plan.summary().delete, 1);
        assert_eq!(plan.actions[0].details["cluster_id"], "42");
    }

    #[test]
    fn test_summary_display() {
        let plan = plan_one(declared(), None);
        assert_eq!(
            plan.summary().to_string(),
            "1 to create, 0 to replace, 0 to update, 0 to delete, 0 unchanged"
        );
    }
}
