use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use sortfeed_core::DataType;
use sortfeed_ingest::{IngestConfig, IngestPipeline};

#[derive(Debug, Parser)]
#[command(name = "sortfeed-cli")]
#[command(about = "Sortfeed intake command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the intake form.
    Serve,
    /// Apply the database schema migrations.
    Migrate,
    /// Reload a date range of one extract type from archived blobs.
    Backfill {
        /// Extract type slug, e.g. `injection-haut` or `qualite-tri`.
        #[arg(long = "type")]
        data_type: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            sortfeed_web::serve_from_env().await?;
        }
        Commands::Migrate => {
            let pipeline = IngestPipeline::from_config(&IngestConfig::from_env())?;
            pipeline.run_migrations().await?;
            println!("migrations applied");
        }
        Commands::Backfill {
            data_type,
            from,
            to,
        } => {
            let Some(data_type) = DataType::from_slug(&data_type) else {
                bail!(
                    "unknown extract type '{data_type}'; expected one of: {}",
                    DataType::ALL
                        .iter()
                        .map(|t| t.slug())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            };
            let pipeline = IngestPipeline::from_config(&IngestConfig::from_env())?;
            let summary = pipeline.backfill(data_type, from, to).await?;
            println!(
                "backfill complete: loaded={} skipped={} rows={}",
                summary.loaded, summary.skipped, summary.rows
            );
        }
    }
    Ok(())
}
