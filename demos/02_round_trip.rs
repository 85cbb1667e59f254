//! Example 02: Spreadsheet Round Trip
//!
//! Exports a log to `UAT_Log_<timestamp>.xlsx` in a temp directory, imports
//! it into a fresh store and shows that a workbook without the required
//! columns is refused.
//!
//! Run with: cargo run --example 02_round_trip

use eyre::Result;
use issuelog::xlsx::{self, Table};
use issuelog::{Category, IssueStore, Severity, export_file_name};
use std::fs;

fn main() -> Result<()> {
    println!("=== Issue Log: Spreadsheet Round Trip ===\n");

    let mut store = IssueStore::new();
    store.create("Report totals differ from ledger", Category::DataIntegrity, Severity::High)?;
    store.create("Add CSV download", Category::FeatureRequest, Severity::Low)?;
    store.set_status(&[2], true)?;

    let dir = std::env::temp_dir().join("issuelog-demo");
    fs::create_dir_all(&dir)?;
    let path = dir.join(export_file_name(&store.now()));
    fs::write(&path, store.export()?)?;
    println!("Exported {} issues to {}", store.len(), path.display());

    let mut restored = IssueStore::new();
    let count = restored.import_xlsx(&fs::read(&path)?)?;
    println!("Imported {} issues; identical: {}", count, restored.issues() == store.issues());

    let broken = Table::from_rows(["Status", "Issue Description"], Vec::new());
    match restored.import_table(&broken) {
        Ok(_) => println!("Unexpectedly accepted a broken table"),
        Err(e) => println!("Rejected broken table: {}", e),
    }
    println!("Log still holds {} issues", restored.len());

    let table = xlsx::read_table(&fs::read(&path)?)?;
    println!("Columns on disk: {}", table.headers.join(", "));

    Ok(())
}
