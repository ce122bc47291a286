//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Scheduling intelligence for a pet-sitting business.
///
/// Imports third-party calendar entries and turns them into workload
/// reports, visit plans with conflict checks, and client suggestions.
#[derive(Debug, Parser)]
#[command(name = "sitter", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import raw calendar entries from a JSON file.
    Import {
        /// JSON file holding an array of calendar entries.
        file: PathBuf,
    },

    /// Classify stored entries into work and personal.
    Classify {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show a workload report.
    Report {
        /// Report a single day.
        #[arg(long, conflicts_with_all = ["week", "month"])]
        day: bool,

        /// Report the Monday-based week (default).
        #[arg(long, conflicts_with = "month")]
        week: bool,

        /// Report the calendar month.
        #[arg(long)]
        month: bool,

        /// Anchor date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Emit JSON instead of the formatted report.
        #[arg(long)]
        json: bool,
    },

    /// Expand a recurrence plan into visits and check for conflicts.
    Plan {
        /// TOML plan file with the booking and optional templates.
        file: PathBuf,

        /// Store the generated visits when there are no conflicts.
        #[arg(long)]
        commit: bool,

        /// Emit JSON instead of the formatted plan.
        #[arg(long)]
        json: bool,
    },

    /// Manage the client roster and label mappings.
    #[command(subcommand)]
    Clients(ClientsAction),

    /// Show database status.
    Status,
}

/// Client roster actions.
#[derive(Debug, Subcommand)]
pub enum ClientsAction {
    /// List known clients with their pets.
    List,

    /// Add or update a client.
    Add {
        /// Display name.
        name: String,

        /// Client ID. Generated when omitted.
        #[arg(long)]
        id: Option<String>,

        /// Pet name. Repeatable.
        #[arg(long = "pet")]
        pets: Vec<String>,
    },

    /// Link a title label to a client.
    Map {
        /// The label as it appears in titles.
        label: String,

        /// The client to link it to.
        client_id: String,
    },

    /// Remove a label link.
    Unmap {
        /// The label to unlink.
        label: String,
    },

    /// Suggest clients for an entry title.
    Suggest {
        /// The entry title to match.
        title: String,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}
