//! cvetrack - command line front end for the CVE registry.
//!
//! Every invocation boots a registry against the configured API and local
//! cache, applies one intent, and prints the resulting record list as JSON on
//! stdout. Warnings go to stderr. The exit status is non-zero only when the
//! intent itself was refused.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use cvetrack_client::HttpStore;
use cvetrack_core::{
    AppConfig, LocalCache, NewRecord, Registry, RegistryError, RemoteStore, Severity, SortField, SortOrder,
    SqliteCache, Status, SyncMode, SyncWarning, ViewParams,
};
use tracing_subscriber::EnvFilter;

/// Exit status for an intent the registry refused.
const EXIT_REJECTED: u8 = 2;

/// cvetrack - CVE record registry
#[derive(Parser, Debug)]
#[command(name = "cvetrack")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Only show records whose id, title, description or affected systems contain this text
    #[arg(long, global = true, default_value = "")]
    filter: String,

    /// Field to order by (id, title, description, severity, status, dateDiscovered, dateAdded, affectedSystems)
    #[arg(long, global = true, default_value = "dateDiscovered")]
    sort: SortField,

    /// Sort direction (asc, desc)
    #[arg(long, global = true, default_value = "desc")]
    order: SortOrder,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the record list
    #[command(alias = "ls")]
    List,

    /// Add a new record
    Add(AddArgs),

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record id
        id: String,
    },

    /// Change a record's status
    Status {
        /// Record id
        id: String,

        /// New status (Open, "In Progress", Mitigated, Resolved)
        status: Status,
    },
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Record id, e.g. CVE-2024-3094
    #[arg(long)]
    id: String,

    /// What the vulnerability is
    #[arg(long)]
    description: String,

    #[arg(long)]
    title: Option<String>,

    /// Critical, High, Medium, Low or Unknown
    #[arg(long)]
    severity: Option<Severity>,

    #[arg(long)]
    status: Option<Status>,

    /// Calendar date, YYYY-MM-DD
    #[arg(long)]
    date_discovered: Option<NaiveDate>,

    #[arg(long)]
    affected_systems: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

impl From<AddArgs> for NewRecord {
    fn from(args: AddArgs) -> Self {
        NewRecord {
            id: Some(args.id),
            title: args.title,
            description: Some(args.description),
            severity: args.severity,
            status: args.status,
            date_discovered: args.date_discovered,
            affected_systems: args.affected_systems,
            notes: args.notes,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load()?;
    let store = HttpStore::new((&config).into()).context("building API client")?;
    let cache = SqliteCache::open(&config.cache_path)
        .await
        .with_context(|| format!("opening local cache at {}", config.cache_path.display()))?;
    let registry = Registry::new(store, cache).with_timeout(config.timeout());

    let loaded = registry.start().await;
    report(&loaded.warnings);

    let code = match apply(&registry, cli.command).await {
        Ok(warnings) => {
            report(&warnings);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("rejected: {e}");
            ExitCode::from(EXIT_REJECTED)
        }
    };

    if registry.mode().await == SyncMode::Degraded {
        eprintln!("warning: working offline; changes are saved locally only");
    }

    let params = ViewParams { filter: cli.filter, sort_field: cli.sort, sort_order: cli.order };
    let view = registry.view(&params).await;
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(code)
}

/// Run one intent, handing back the warnings it produced.
async fn apply<S: RemoteStore, C: LocalCache>(
    registry: &Registry<S, C>, command: Commands,
) -> Result<Vec<SyncWarning>, RegistryError> {
    let warnings = match command {
        Commands::List => Vec::new(),
        Commands::Add(args) => registry.add(args.into()).await?.warnings,
        Commands::Delete { id } => registry.delete(&id).await?.warnings,
        Commands::Status { id, status } => registry.update_status(&id, status).await?.warnings,
    };
    Ok(warnings)
}

fn report(warnings: &[SyncWarning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}
