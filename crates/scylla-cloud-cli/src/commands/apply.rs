use crate::context::Project;
use crate::utils;
use anyhow::Context;
use colored::Colorize;
use scylla_cloud::{
    ActionType, ApplyResult, ClusterResource, GlobalState, ResourceData, StateManager,
    cluster_schema,
};
use tokio_util::sync::CancellationToken;

pub async fn handle(project: &Project, yes: bool, cancel: &CancellationToken) -> anyhow::Result<()> {
    project.validate()?;

    let lock = project.state.acquire_lock().await?;
    let mut state = project.state.load().await?;
    let plan = scylla_cloud::plan(&project.config.clusters, &state.records(), &cluster_schema());

    utils::print_plan(&plan);
    if !plan.has_changes {
        println!("{}", "No changes. Clusters match the project file.".green());
        lock.release().await?;
        return Ok(());
    }

    if !yes && !utils::confirm("Apply these changes?")? {
        println!("{}", "Apply cancelled.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let resource = project.connect().await?;
    let start = std::time::Instant::now();
    let mut result = ApplyResult::new();

    for action in &plan.actions {
        let key = action.resource_id.as_str();
        let outcome = match action.action_type {
            ActionType::NoOp => continue,
            ActionType::Create => {
                println!("{} {}", "Creating".cyan().bold(), key);
                create(&resource, project, &mut state, key, cancel).await
            }
            ActionType::Replace => {
                println!("{} {}", "Replacing".yellow().bold(), key);
                match delete(&resource, &project.state, &mut state, key, cancel).await {
                    Ok(()) => create(&resource, project, &mut state, key, cancel).await,
                    Err(e) => Err(e),
                }
            }
            ActionType::Update => match state.get_resource(key) {
                Some(committed) => resource.update(&committed.data).map_err(Into::into),
                None => Err(anyhow::anyhow!("cluster {} is not committed", key)),
            },
            ActionType::Delete => {
                println!("{} {}", "Deleting".red().bold(), key);
                delete(&resource, &project.state, &mut state, key, cancel).await
            }
        };

        match outcome {
            Ok(()) => result.add_success(action.id.clone(), action.description.clone()),
            Err(e) => result.add_failure(action.id.clone(), format!("{:#}", e)),
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    lock.release().await?;

    utils::print_result(&result);
    if !result.is_success() {
        anyhow::bail!("{} action(s) failed", result.failed.len());
    }
    Ok(())
}

/// Create the declared cluster `key`, committing whatever identity it got
///
/// A record whose creation was submitted but not observed to finish is still
/// saved, so `refresh` can resume waiting on it.
async fn create(
    resource: &ClusterResource,
    project: &Project,
    state: &mut GlobalState,
    key: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut data: ResourceData = project
        .config
        .clusters
        .get(key)
        .cloned()
        .with_context(|| format!("cluster {} is not declared", key))?;

    let created = resource.create(&mut data, cancel).await;
    if data.exists() {
        state.set_resource(key, data);
        project.state.save(state).await?;
    }
    created?;
    Ok(())
}

/// Submit deletion of the committed cluster `key` and drop its record
pub(crate) async fn delete(
    resource: &ClusterResource,
    manager: &StateManager,
    state: &mut GlobalState,
    key: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let committed = state
        .get_resource(key)
        .with_context(|| format!("cluster {} is not committed", key))?;

    resource.delete(&committed.data, cancel).await?;
    state.remove_resource(key);
    manager.save(state).await?;
    Ok(())
}
