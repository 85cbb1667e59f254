use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use issuelog::{Category, Config, Filter, Issue, IssuePatch, IssueStore, Metrics, Session, Severity};
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "issuelog")]
#[command(about = "Testing issue tracker - log, resolve and export UAT issues")]
#[command(version)]
struct Cli {
    /// Working log (.xlsx); defaults to `working_file` from the config
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Config file (default: <config dir>/issuelog/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new issue
    Add {
        description: String,

        /// e.g. "Functional Bug", "ui-ux-defect", "performance"
        #[arg(short, long)]
        category: Option<Category>,

        /// Low, Medium, High or Critical
        #[arg(short, long)]
        severity: Option<Severity>,
    },

    /// Show the issue table
    List {
        /// field=value, field!=value or field~value (repeatable)
        #[arg(short = 'f', long = "filter")]
        filters: Vec<Filter>,

        #[arg(long)]
        json: bool,
    },

    /// Mark rows resolved
    Close {
        #[arg(required = true)]
        rows: Vec<usize>,
    },

    /// Mark rows open again
    Reopen {
        #[arg(required = true)]
        rows: Vec<usize>,
    },

    /// Change fields of one row
    Edit {
        row: usize,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        category: Option<Category>,

        #[arg(short, long)]
        severity: Option<Severity>,
    },

    /// Remove rows
    Delete {
        #[arg(required = true)]
        rows: Vec<usize>,
    },

    /// Show summary counts
    Metrics {
        #[arg(long)]
        json: bool,
    },

    /// Replace the log with an .xlsx file
    Import { path: PathBuf },

    /// Write UAT_Log_<timestamp>.xlsx
    Export {
        /// Output directory (default: `export_dir` from the config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let path = cli.file.unwrap_or_else(|| config.working_file.clone());
    let mut session = Session::open(&path, &config)?;

    match cli.command {
        Commands::Add {
            description,
            category,
            severity,
        } => {
            let category = category.unwrap_or(config.default_category);
            let severity = severity.unwrap_or(config.default_severity);
            add_issue(session.store_mut(), &description, category, severity)?;
            session.commit()?;
        }
        Commands::List { filters, json } => {
            let listed = session.store().list(&filters);
            if json {
                print_json(&listed)?;
            } else if session.store().is_empty() {
                println!("No issues logged yet. Start by submitting a new entry with `issuelog add`.");
            } else {
                print_table(&listed);
            }
        }
        Commands::Close { rows } => {
            let changed = session.store_mut().set_status(&rows, true)?;
            session.commit()?;
            println!("Closed {} issue(s)", changed);
        }
        Commands::Reopen { rows } => {
            let changed = session.store_mut().set_status(&rows, false)?;
            session.commit()?;
            println!("Reopened {} issue(s)", changed);
        }
        Commands::Edit {
            row,
            description,
            category,
            severity,
        } => {
            let patch = IssuePatch {
                description,
                category,
                severity,
                status: None,
            };
            if patch.is_empty() {
                return Err(eyre!("Nothing to edit: pass --description, --category or --severity"));
            }
            session.store_mut().edit_row(row, patch)?;
            session.commit()?;
            println!("Updated issue #{}", row);
        }
        Commands::Delete { rows } => {
            let count = session.store_mut().delete_rows(&rows)?;
            session.commit()?;
            println!("Deleted {} issue(s)", count);
        }
        Commands::Metrics { json } => {
            let metrics = session.store().metrics();
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                print_metrics(&metrics);
            }
        }
        Commands::Import { path: source } => {
            let bytes = std::fs::read(&source).with_context(|| format!("Failed to read {}", source.display()))?;
            let count = session.store_mut().import_xlsx(&bytes)?;
            session.commit()?;
            println!("Imported {} issue(s) from {}", count, source.display());
        }
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let written = session.export_to(&dir)?;
            println!("Exported {} issue(s) to {}", session.store().len(), written.display());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn add_issue(store: &mut IssueStore, description: &str, category: Category, severity: Severity) -> Result<()> {
    store.create(description, category, severity)?;
    println!(
        "{} issue #{} [{} / {}]",
        "Logged".green().bold(),
        store.len(),
        category,
        severity
    );
    Ok(())
}

#[derive(Serialize)]
struct ListedIssue<'a> {
    row: usize,
    #[serde(flatten)]
    issue: &'a Issue,
}

fn print_json(listed: &[(usize, &Issue)]) -> Result<()> {
    let rows: Vec<ListedIssue> = listed
        .iter()
        .map(|&(row, issue)| ListedIssue { row, issue })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_table(listed: &[(usize, &Issue)]) {
    println!(
        "{}",
        format!(
            "{:>4}  {:<6}  {:<16}  {:<8}  {:<15}  {:<16}  {}",
            "#", "Status", "Time Found", "Severity", "Category", "Resolved At", "Description"
        )
        .bold()
    );

    for (row, issue) in listed {
        let status = format!("{:<6}", issue.status_label());
        let status = if issue.is_closed() { status.green() } else { status.yellow() };

        let severity = format!("{:<8}", issue.severity.as_str());
        let severity = match issue.severity {
            Severity::Critical => severity.red().bold(),
            Severity::High => severity.red(),
            Severity::Medium => severity.yellow(),
            Severity::Low => severity.normal(),
        };

        println!(
            "{:>4}  {}  {:<16}  {}  {:<15}  {:<16}  {}",
            row,
            status,
            issue.time_found,
            severity,
            issue.category.as_str(),
            issue.time_resolved,
            issue.description
        );
    }

    if listed.is_empty() {
        println!("{}", "No issues match the given filters.".dimmed());
    }
}

fn print_metrics(metrics: &Metrics) {
    println!("{:<16} {}", "Total Issues", metrics.total.to_string().bold());
    println!("{:<16} {}", "Pending", metrics.pending.to_string().yellow());
    println!("{:<16} {}", "Resolved", metrics.resolved.to_string().green());
    println!("{:<16} {}", "Critical / High", metrics.critical_or_high.to_string().red());
}
