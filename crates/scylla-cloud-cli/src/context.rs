//! Project file, state location and API bootstrap shared by the commands

use anyhow::Context;
use colored::Colorize;
use scylla_cloud::{ClusterResource, HttpClient, StateManager, cluster_schema};
use scylla_cloud_config::ProjectConfig;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Project {
    pub config_path: PathBuf,
    pub config: ProjectConfig,
    pub state: StateManager,
}

impl Project {
    /// Find and parse the project file; state lives under the current directory
    pub fn load() -> anyhow::Result<Self> {
        let (config_path, config) = scylla_cloud_config::load_project()?;
        let root = std::env::current_dir()?;

        println!(
            "{} {}",
            "Project file:".dimmed(),
            config_path.display().to_string().cyan()
        );

        Ok(Self {
            config_path,
            config,
            state: StateManager::new(root),
        })
    }

    /// Reject declared clusters that do not fit the attribute table
    pub fn validate(&self) -> anyhow::Result<()> {
        let schema = cluster_schema();
        for (key, data) in &self.config.clusters {
            data.validate(&schema)
                .with_context(|| format!("cluster {:?} in {}", key, self.config_path.display()))?;
        }
        Ok(())
    }

    /// Connect to the API and load the metadata catalog
    pub async fn connect(&self) -> anyhow::Result<ClusterResource> {
        let provider = &self.config.provider;
        let client = HttpClient::connect(provider.client_config()?)
            .await
            .context("connecting to ScyllaDB Cloud")?;
        tracing::info!(account_id = client.account_id(), "Connected to ScyllaDB Cloud");

        let catalog = client
            .load_catalog()
            .await
            .context("loading deployment catalog")?;

        Ok(ClusterResource::new(Arc::new(client), Arc::new(catalog))
            .with_timeouts(provider.timeouts)
            .with_poll_interval(provider.poll_interval))
    }
}
