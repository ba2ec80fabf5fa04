mod commands;
mod context;
mod utils;

use clap::{Parser, Subcommand};
use context::Project;

#[derive(Parser)]
#[command(name = "scylla-cloud")]
#[command(about = "Declarative ScyllaDB Cloud cluster management", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes apply would make
    Plan,
    /// Create, replace and delete clusters to match the project file
    Apply {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-read committed clusters from ScyllaDB Cloud
    Refresh,
    /// Delete committed clusters
    Destroy {
        /// Cluster label (all committed clusters when omitted)
        cluster: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Adopt an existing cluster by id
    Import {
        /// Cluster label to record it under
        cluster: String,
        /// Remote cluster id
        id: String,
    },
    /// Print the cluster attribute table
    Schema {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cancel = utils::shutdown_token();

    match cli.command {
        Commands::Plan => commands::plan::handle(&Project::load()?).await,
        Commands::Apply { yes } => commands::apply::handle(&Project::load()?, yes, &cancel).await,
        Commands::Refresh => commands::refresh::handle(&Project::load()?, &cancel).await,
        Commands::Destroy { cluster, yes } => {
            commands::destroy::handle(&Project::load()?, cluster.as_deref(), yes, &cancel).await
        }
        Commands::Import { cluster, id } => {
            commands::import::handle(&Project::load()?, &cluster, &id, &cancel).await
        }
        // Needs neither a project file nor credentials.
        Commands::Schema { json } => commands::schema::handle(json),
    }
}
