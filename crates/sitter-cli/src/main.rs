use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sitter_cli::commands::{classify, clients, import, plan, report, status};
use sitter_cli::{Cli, ClientsAction, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(sitter_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    // Threshold ordering is caller-supplied; surface violations but keep
    // going with the degraded buckets.
    for problem in config.workload.thresholds.validate() {
        tracing::warn!(%problem, "threshold configuration problem");
    }

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = sitter_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Import { file }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut out, &mut db, file)?;
        }
        Some(Commands::Classify { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            classify::run(&mut out, &db, *json)?;
        }
        Some(Commands::Report { day, week: _, month, date, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let period = if *day {
                report::Period::Day
            } else if *month {
                report::Period::Month
            } else {
                report::Period::Week
            };
            report::run(&mut out, &db, period, *date, *json, &config.workload)?;
        }
        Some(Commands::Plan { file, commit, json }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            plan::run(&mut out, &mut db, file, *commit, *json)?;
        }
        Some(Commands::Clients(action)) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            match action {
                ClientsAction::List => clients::list(&mut out, &db)?,
                ClientsAction::Add { name, id, pets } => {
                    clients::add(&mut out, &mut db, name, id.as_deref(), pets)?;
                }
                ClientsAction::Map { label, client_id } => {
                    clients::map(&mut out, &db, label, client_id)?;
                }
                ClientsAction::Unmap { label } => clients::unmap(&mut out, &db, label)?,
                ClientsAction::Suggest { title, json } => {
                    clients::run_suggest(&mut out, &db, title, *json, &config.match_weights)?;
                }
            }
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut out, &db, &config.database_path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
