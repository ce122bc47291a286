//! Status command for showing what the database holds.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use sitter_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    writeln!(writer, "Sitter status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Entries:  {}", db.count_entries()?)?;
    writeln!(writer, "Clients:  {}", db.count_clients()?)?;
    writeln!(writer, "Mappings: {}", db.count_mappings()?)?;
    Ok(())
}
