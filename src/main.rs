//! Binary entry point for crmcheck.
//!
//! Exposes record validation and live duplicate checking on the command line.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stdout/print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use crmcheck::config::CrmCheckConfig;
use crmcheck::observability::{self, LoggingConfig};
use crmcheck::{
    CheckableAttributes, DuplicateCoordinator, DuplicateState, HttpDuplicateLookup, RecordKind,
    Schema,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// crmcheck - duplicate detection and validation for CRM records.
#[derive(Parser)]
#[command(name = "crmcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "CRMCHECK_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a record payload against a schema.
    Validate {
        /// Schema name: deal, company, or contact.
        #[arg(short, long)]
        schema: String,

        /// JSON payload file (reads stdin when omitted).
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Look up duplicates for one set of attributes.
    Check {
        /// Record kind: company or contact.
        #[arg(short, long)]
        kind: String,

        /// Attribute as KEY=VALUE (repeatable).
        #[arg(short, long = "attr")]
        attributes: Vec<String>,

        /// Identity of the record being edited.
        #[arg(long)]
        id: Option<i64>,
    },

    /// Stream edit events from stdin (one JSON object per line) and print the
    /// duplicate state whenever it changes. States replaced before they are
    /// printed are coalesced.
    Watch {
        /// Record kind: company or contact.
        #[arg(short, long)]
        kind: String,

        /// Identity of the record being edited.
        #[arg(long)]
        id: Option<i64>,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match CrmCheckConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Validate { schema, file } => cmd_validate(&schema, file),
        Commands::Check {
            kind,
            attributes,
            id,
        } => cmd_check(&config, &kind, &attributes, id).await,
        Commands::Watch { kind, id } => cmd_watch(&config, &kind, id).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Validates a payload and prints the record or every field error.
fn cmd_validate(schema: &str, file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let schema = Schema::by_name(schema).ok_or_else(|| anyhow!("unknown schema '{schema}'"))?;

    let contents = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        },
    };
    let payload: serde_json::Value =
        serde_json::from_str(&contents).context("payload is not valid JSON")?;

    match schema.validate(&payload) {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        },
        Err(errors) => {
            metrics::counter!("validation_failures_total", "schema" => schema.name()).increment(1);
            tracing::debug!(
                schema = schema.name(),
                error_count = errors.len(),
                "Record failed validation"
            );
            for error in &errors {
                println!("{error}");
            }
            Ok(ExitCode::from(1))
        },
    }
}

/// Runs a single debounced lookup and prints the candidates.
async fn cmd_check(
    config: &CrmCheckConfig,
    kind: &str,
    pairs: &[String],
    id: Option<i64>,
) -> anyhow::Result<ExitCode> {
    let kind = parse_kind(kind)?;
    let mut attributes = CheckableAttributes::for_kind(kind);
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("attribute '{pair}' is not KEY=VALUE"))?;
        attributes.set(key.trim(), Some(value))?;
    }

    let lookup = HttpDuplicateLookup::new(&config.duplicates)?;
    let coordinator = DuplicateCoordinator::new(kind, id, lookup, &config.duplicates)?;

    coordinator.check_duplicates(attributes);
    let settled = tokio::time::timeout(settle_deadline(config), coordinator.settled())
        .await
        .map_err(|_| anyhow!("duplicate lookup did not complete"))?;

    println!("{}", serde_json::to_string_pretty(&settled.duplicates)?);
    Ok(ExitCode::SUCCESS)
}

/// Feeds stdin edit events into a coordinator, printing state changes.
async fn cmd_watch(
    config: &CrmCheckConfig,
    kind: &str,
    id: Option<i64>,
) -> anyhow::Result<ExitCode> {
    let kind = parse_kind(kind)?;
    let lookup = HttpDuplicateLookup::new(&config.duplicates)?;
    let coordinator = DuplicateCoordinator::new(kind, id, lookup, &config.duplicates)?;

    let mut updates = coordinator.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state: DuplicateState = updates.borrow_and_update().clone();
            match serde_json::to_string(&state) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize state"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<serde_json::Value>(&line)
            .map_err(|e| crmcheck::Error::InvalidInput(e.to_string()))
            .and_then(|value| CheckableAttributes::from_json(kind, &value));
        match parsed {
            Ok(attributes) => coordinator.check_duplicates(attributes),
            Err(e) => tracing::warn!(error = %e, "Skipping malformed edit event"),
        }
    }

    // Let the last burst settle before tearing the session down.
    if tokio::time::timeout(settle_deadline(config), coordinator.settled())
        .await
        .is_err()
    {
        tracing::warn!("Last duplicate lookup did not settle before exit");
    }

    drop(coordinator);
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    Ok(ExitCode::SUCCESS)
}

/// Longest a single debounced lookup can take to settle.
fn settle_deadline(config: &CrmCheckConfig) -> Duration {
    config.duplicates.debounce + config.duplicates.request_timeout + Duration::from_secs(1)
}

fn parse_kind(kind: &str) -> anyhow::Result<RecordKind> {
    match RecordKind::parse(kind) {
        Some(kind) => Ok(kind),
        None => bail!("unknown record kind '{kind}' (expected company or contact)"),
    }
}
