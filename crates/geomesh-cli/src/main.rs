mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geomesh-cli")]
#[command(about = "Closest mesh node lookup and learning assistant")]
struct Cli {
    /// Dataset CSV (defaults to `GEOMESH_DATASET_PATH`)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the closest node and its distance
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Resolve the closest node, then ask the assistant
    Ask {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Serve the canned offline answer instead of calling the API
        #[arg(long)]
        offline: bool,
        /// Question text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List indexed nodes
    Nodes,
    /// Load the dataset and report skipped rows
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = geomesh_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let dataset = cli.dataset.unwrap_or_else(|| config.dataset_path.clone());

    match cli.command {
        Some(Commands::Nearest { lat, lon }) => commands::run_nearest(&dataset, lat, lon)?,
        Some(Commands::Ask {
            lat,
            lon,
            offline,
            question,
        }) => {
            commands::run_ask(
                &dataset,
                &config.assistant,
                lat,
                lon,
                &question.join(" "),
                offline,
            )
            .await?;
        }
        Some(Commands::Nodes) => commands::run_nodes(&dataset)?,
        Some(Commands::Validate) => commands::run_validate(&dataset)?,
        None => println!("geomesh-cli: run with --help to see available commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
