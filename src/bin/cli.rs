//! Parish calendar CLI
//!
//! Local execution entry point, also run by the scheduled publishing job.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use parish_calendar::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    services::HttpFetcher,
    storage::LocalStorage,
};

/// Parish council meeting calendar generator
#[derive(Parser, Debug)]
#[command(
    name = "parish-calendar",
    version,
    about = "Publishes parish council meetings as an iCalendar feed"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch meeting pages and write the calendar
    Generate {
        /// Output file (default: calendar.output_path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat this RFC 3339 instant as the current time
        #[arg(long)]
        now: Option<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Check that a calendar file is well formed
    Check {
        /// Calendar file (default: calendar.output_path)
        path: Option<PathBuf>,
    },
}

/// Initialize logging from the verbosity flag or configured level.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_now(value: Option<&str>) -> Result<DateTime<Utc>> {
    match value {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|instant| instant.with_timezone(&Utc))
            .map_err(|e| AppError::validation(format!("Invalid --now '{text}': {e}"))),
        None => Ok(Utc::now()),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = match &loaded {
        _ if cli.verbose => "debug".to_string(),
        Ok(config) => config.logging.level.clone(),
        Err(_) => "info".to_string(),
    };
    init_logging(&level);

    let config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });

    match cli.command {
        Command::Generate { output, now } => {
            config.validate()?;
            let now = parse_now(now.as_deref())?;
            let output = output.unwrap_or_else(|| PathBuf::from(&config.calendar.output_path));

            let fetcher = HttpFetcher::new(config.fetcher.clone())?;
            let storage = LocalStorage::new(&output);
            let (stats, written) =
                pipeline::run_generate(&config, &fetcher, &storage, now).await?;

            log::info!(
                "Calendar {} with {} event(s): {}",
                if written.changed { "updated" } else { "unchanged" },
                stats.events,
                storage.path().display()
            );
        }

        Command::Validate => {
            pipeline::run_validate(&cli.config)?;
        }

        Command::Check { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(&config.calendar.output_path));
            pipeline::run_check(&path).await?;
        }
    }

    Ok(())
}
