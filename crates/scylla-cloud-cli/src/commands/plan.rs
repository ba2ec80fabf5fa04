use crate::context::Project;
use crate::utils;
use colored::Colorize;
use scylla_cloud::cluster_schema;

pub async fn handle(project: &Project) -> anyhow::Result<()> {
    project.validate()?;

    let state = project.state.load().await?;
    let plan = scylla_cloud::plan(&project.config.clusters, &state.records(), &cluster_schema());

    utils::print_plan(&plan);
    if !plan.has_changes {
        println!("{}", "No changes. Clusters match the project file.".green());
    }
    Ok(())
}
