//! CLI subcommand implementations.

pub mod classify;
pub mod clients;
pub mod import;
pub mod plan;
pub mod report;
pub mod status;
