//! Example 01: Basic Session
//!
//! Logs a few issues, resolves one, deletes one and prints the summary
//! counts, all against a store held in memory.
//!
//! Run with: cargo run --example 01_basic_session

use eyre::Result;
use issuelog::{Category, IssuePatch, IssueStore, Severity};

fn main() -> Result<()> {
    println!("=== Issue Log: Basic Session ===\n");

    let mut store = IssueStore::new();

    store.create("Checkout total ignores discount", Category::FunctionalBug, Severity::Critical)?;
    store.create("Sidebar overlaps footer on mobile", Category::UiUxDefect, Severity::Medium)?;
    store.create("Dashboard takes 8s to load", Category::Performance, Severity::High)?;
    store.create("Typo on settings page", Category::Other, Severity::Low)?;
    println!("Logged {} issues", store.len());

    // Empty descriptions are refused and leave the log untouched
    if let Err(e) = store.create("   ", Category::Other, Severity::Low) {
        println!("Rejected: {}", e);
    }

    store.set_status(&[1], true)?;
    println!("Closed #1 at {}", store.get(1).map(|i| i.time_resolved.as_str()).unwrap_or(""));

    store.edit_row(
        3,
        IssuePatch {
            severity: Some(Severity::Medium),
            ..Default::default()
        },
    )?;

    store.delete_rows(&[4])?;

    println!("\nCurrent log:");
    for (row, issue) in store.list(&[]) {
        println!(
            "  #{} [{}] {} / {} - {}",
            row,
            issue.status_label(),
            issue.category,
            issue.severity,
            issue.description
        );
    }

    let metrics = store.metrics();
    println!(
        "\nTotal: {}  Pending: {}  Resolved: {}  Critical/High: {}",
        metrics.total, metrics.pending, metrics.resolved, metrics.critical_or_high
    );

    Ok(())
}
