//! Sismo CLI
//!
//! Runs the webhook server or single pipeline steps from the terminal.

use std::path::PathBuf;
#[cfg(feature = "server")]
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sismo::{
    error::Result,
    models::Config,
    pipeline::{self, NotificationPipeline, PipelineOutcome},
    services::{BulletinFetcher, parse_record, resolve_location},
};

/// Sismo - seismic bulletin notifier
#[derive(Parser, Debug)]
#[command(
    name = "sismo",
    version,
    about = "Renders notification cards for new INETER bulletin events"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sismo.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve GET /webhook and the card directory
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (default: server.bind_addr)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run the pipeline once against the live bulletin
    Check,

    /// Fetch and print the latest bulletin event without rendering
    Latest,

    /// Parse a bulletin line offline and show how it resolves
    Parse {
        /// Raw bulletin line
        line: String,
    },

    /// Render a card for a given bulletin line
    Render {
        /// Raw bulletin line
        line: String,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(outcome: &PipelineOutcome) -> Result<()> {
    match outcome {
        PipelineOutcome::Rendered { notification, .. } => {
            log::info!("Card saved as {}", notification.image)
        }
        PipelineOutcome::Duplicate { event } => {
            log::info!("Event {} already has a card", event.timestamp)
        }
    }
    print_json(outcome)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::debug!("Using configuration from {}", cli.config.display());

    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve { bind } => {
            config.validate()?;
            let bind_addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
            let pipeline = Arc::new(NotificationPipeline::from_config(&config)?);
            sismo::server::serve(pipeline, &config.render.output_dir, &bind_addr).await?;
        }

        Command::Check => {
            config.validate()?;
            let pipeline = NotificationPipeline::from_config(&config)?;
            report(&pipeline.run().await?)?;
        }

        Command::Latest => {
            let fetcher = BulletinFetcher::new(&config.source)?;
            log::info!("Fetching {}", fetcher.url());
            let event = pipeline::run_latest(&fetcher).await?;
            print_json(&event)?;
        }

        Command::Parse { line } => {
            let event = parse_record(&line)?;
            let resolved = resolve_location(&event.location);
            if resolved.country_code.is_none() {
                log::warn!("'{}' has no country code", resolved.country_name);
            }
            let occurred_at = event.occurred_at().map(|t| t.to_string());
            print_json(&serde_json::json!({
                "event": event,
                "occurred_at": occurred_at,
                "resolved": resolved,
            }))?;
        }

        Command::Render { line } => {
            config.validate()?;
            let pipeline = NotificationPipeline::from_config(&config)?;
            report(&pipeline.run_line(line).await?)?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
