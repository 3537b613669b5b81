use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use platewise_core::RestaurantId;
use platewise_server::config::DATABASE_FILE;
use platewise_server::{RatingAggregator, SqliteRepository, Store};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Platewise: maintenance commands for the review database
#[derive(Parser, Debug)]
#[command(name = "platewise")]
#[command(about = "Maintenance commands for the platewise review database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute restaurant rating aggregates from their active reviews
    Recompute(RecomputeArgs),
    /// Print site-wide statistics as JSON
    Stats(StatsArgs),
}

#[derive(Parser, Debug)]
struct RecomputeArgs {
    /// Directory holding the platewise database
    #[arg(long, env = "STATE_DIR", default_value = ".")]
    state_dir: PathBuf,

    /// Only recompute this restaurant (default: all of them)
    #[arg(long)]
    restaurant: Option<i64>,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Directory holding the platewise database
    #[arg(long, env = "STATE_DIR", default_value = ".")]
    state_dir: PathBuf,
}

fn open_store(state_dir: &Path) -> Result<Arc<dyn Store>> {
    let db_path = state_dir.join(DATABASE_FILE);
    let repository = SqliteRepository::new(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    Ok(Arc::new(repository))
}

async fn recompute(args: RecomputeArgs) -> Result<()> {
    let store = open_store(&args.state_dir)?;
    let aggregator = RatingAggregator::new(store.clone());

    match args.restaurant {
        Some(id) => {
            let aggregate = aggregator
                .recompute_restaurant_rating(RestaurantId(id))
                .await
                .with_context(|| format!("Failed to recompute restaurant {}", id))?;
            println!(
                "{}",
                json!({
                    "restaurant_id": id,
                    "average_rating": aggregate.average_rating,
                    "total_reviews": aggregate.total_reviews,
                })
            );
        }
        None => {
            let count = aggregator
                .recompute_all()
                .await
                .context("Failed to recompute restaurants")?;
            println!("Recomputed {} restaurants", count);
        }
    }
    Ok(())
}

async fn stats(args: StatsArgs) -> Result<()> {
    let store = open_store(&args.state_dir)?;
    let stats = store
        .collect_stats()
        .await
        .context("Failed to collect stats")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recompute(args) => recompute(args).await,
        Commands::Stats(args) => stats(args).await,
    }
}
