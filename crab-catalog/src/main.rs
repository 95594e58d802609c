//! crab-catalog CLI
//!
//! Runs clones and reconciliations against the PostgreSQL catalog.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use crab_catalog::store::PgCatalog;
use crab_catalog::{
    CloneOrchestrator, CloneRequest, CloneResult, Config, LogProgress, MergeStrategy, Stores,
    logger,
};
use sqlx::PgPool;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "crab-catalog", version, about = "Tenant catalog cloning and category sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clone one tenant's catalog into another
    Clone {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        /// Delete the target's categories and products first
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        no_categories: bool,
        #[arg(long)]
        no_products: bool,
        #[arg(long)]
        no_images: bool,
        /// Copy image binaries instead of referencing the source URLs
        #[arg(long)]
        physical: bool,
        #[arg(long, env = "CLONE_MAX_PRODUCTS")]
        max_products: Option<usize>,
    },
    /// Categories and a few products, no images
    QuickCopy {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
    },
    /// Rebuild a tenant's category display settings
    Reconcile {
        #[arg(long)]
        tenant: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();

    logger::init_logger(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    tracing::info!("Starting crab-catalog (env: {})", config.environment);

    let pool = PgPool::connect(config.require_database_url()?).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3 = aws_sdk_s3::Client::new(&aws_config);
    let backend = Arc::new(PgCatalog::new(pool).with_blob_bucket(s3, &config.image_s3_bucket));
    let orchestrator = CloneOrchestrator::from_config(Stores::from_backend(backend), &config);

    let result = match cli.command {
        Command::Clone {
            source,
            target,
            replace,
            no_categories,
            no_products,
            no_images,
            physical,
            max_products,
        } => {
            let strategy = if replace {
                MergeStrategy::Replace
            } else {
                MergeStrategy::Merge
            };
            let req = CloneRequest::new(source, target)
                .with_strategy(strategy)
                .with_categories(!no_categories)
                .with_products(!no_products)
                .with_images(!no_images)
                .with_physical_duplicate(physical)
                .with_max_products(max_products.unwrap_or(config.clone_max_products));
            orchestrator.clone_catalog(&req, &LogProgress).await
        }
        Command::QuickCopy { source, target } => {
            orchestrator.quick_copy(&source, &target, &LogProgress).await
        }
        Command::Reconcile { tenant } => {
            let document = orchestrator
                .reconciler()
                .reconcile(&tenant)
                .await
                .map_err(shared::error::AppError::from)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
            return Ok(ExitCode::SUCCESS);
        }
    };

    print_result(&result)?;
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_result(result: &CloneResult) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
