use crate::context::Project;
use crate::utils;
use colored::Colorize;
use scylla_cloud::ApplyResult;
use tokio_util::sync::CancellationToken;

pub async fn handle(project: &Project, cancel: &CancellationToken) -> anyhow::Result<()> {
    let lock = project.state.acquire_lock().await?;
    let mut state = project.state.load().await?;

    if state.resources.is_empty() {
        println!("{}", "No committed clusters to refresh.".yellow());
        lock.release().await?;
        return Ok(());
    }

    let resource = project.connect().await?;
    let start = std::time::Instant::now();
    let mut result = ApplyResult::new();

    for (key, mut data) in state.records() {
        println!("{} {}", "Refreshing".cyan().bold(), key);
        let action_id = format!("refresh-{}", key);

        match resource.read(&mut data, cancel).await {
            Ok(()) => {
                state.set_resource(key.clone(), data);
                project.state.save(&state).await?;
                result.add_success(action_id, format!("Cluster {} refreshed", key));
            }
            Err(e) => result.add_failure(action_id, e.to_string()),
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    lock.release().await?;

    utils::print_result(&result);
    if !result.is_success() {
        anyhow::bail!("{} cluster(s) could not be refreshed", result.failed.len());
    }
    Ok(())
}
