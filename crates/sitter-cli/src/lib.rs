//! Pet-sitting toolkit CLI library.
//!
//! This crate provides the CLI interface for the scheduling toolkit.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, ClientsAction, Commands};
pub use config::Config;
