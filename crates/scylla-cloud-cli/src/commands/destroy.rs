use crate::commands::apply;
use crate::context::Project;
use crate::utils;
use colored::Colorize;
use scylla_cloud::ApplyResult;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    project: &Project,
    cluster: Option<&str>,
    yes: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let lock = project.state.acquire_lock().await?;
    let mut state = project.state.load().await?;

    let targets: Vec<String> = match cluster {
        Some(key) if state.get_resource(key).is_some() => vec![key.to_string()],
        Some(key) => {
            lock.release().await?;
            anyhow::bail!("cluster {} is not committed", key);
        }
        None => state.resources.keys().cloned().collect(),
    };

    if targets.is_empty() {
        println!("{}", "No committed clusters to destroy.".yellow());
        lock.release().await?;
        return Ok(());
    }

    println!();
    for key in &targets {
        println!("  {}", format!("- Delete cluster {}", key).red());
    }
    println!();

    if !yes && !utils::confirm("Destroy these clusters?")? {
        println!("{}", "Destroy cancelled.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let resource = project.connect().await?;
    let start = std::time::Instant::now();
    let mut result = ApplyResult::new();

    for key in &targets {
        println!("{} {}", "Deleting".red().bold(), key);
        let action_id = format!("delete-{}", key);
        match apply::delete(&resource, &project.state, &mut state, key, cancel).await {
            Ok(()) => result.add_success(action_id, format!("Deletion of {} accepted", key)),
            Err(e) => result.add_failure(action_id, format!("{:#}", e)),
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    lock.release().await?;

    utils::print_result(&result);
    if !result.is_success() {
        anyhow::bail!("{} cluster(s) could not be deleted", result.failed.len());
    }
    Ok(())
}
