use crate::context::Project;
use colored::Colorize;
use scylla_cloud::ResourceData;
use tokio_util::sync::CancellationToken;

pub async fn handle(
    project: &Project,
    key: &str,
    id: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let lock = project.state.acquire_lock().await?;
    let mut state = project.state.load().await?;

    if state.get_resource(key).is_some() {
        lock.release().await?;
        anyhow::bail!("cluster {} is already committed", key);
    }
    if !project.config.clusters.contains_key(key) {
        println!(
            "{} {} is not declared in the project file; the next apply will delete it",
            "Warning:".yellow().bold(),
            key
        );
    }

    let resource = project.connect().await?;
    let mut data = ResourceData::imported(id);
    resource.read(&mut data, cancel).await?;

    state.set_resource(key, data);
    project.state.save(&state).await?;
    lock.release().await?;

    println!("{} cluster {} imported as {}", "✓".green(), id, key.cyan());
    Ok(())
}
