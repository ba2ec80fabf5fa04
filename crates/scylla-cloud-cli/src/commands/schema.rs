use colored::Colorize;
use scylla_cloud::{RESOURCE_TYPE, cluster_schema};

pub fn handle(json: bool) -> anyhow::Result<()> {
    let schema = cluster_schema();

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("{}", RESOURCE_TYPE.bold());
    for attribute in &schema {
        let mut flags = Vec::new();
        if attribute.required {
            flags.push("required");
        }
        if attribute.optional {
            flags.push("optional");
        }
        if attribute.computed {
            flags.push("computed");
        }
        if attribute.force_new {
            flags.push("force-new");
        }

        let default = attribute
            .default
            .as_ref()
            .map(|v| format!(" (default {})", v))
            .unwrap_or_default();

        println!(
            "  {:<28} {:<7} {:<36} {}{}",
            attribute.name.cyan(),
            attribute.kind.to_string(),
            flags.join(", ").dimmed(),
            attribute.description,
            default
        );
    }
    Ok(())
}
