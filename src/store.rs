// In-memory issue log with spreadsheet import/export

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::StoreError;
use crate::filter::Filter;
use crate::models::{Category, Issue, IssueRow, Metrics, Severity};
use crate::xlsx::{self, ExportLayout, Table};
use eyre::{Context, Result};
use tracing::{debug, info};

/// Field changes for a single row; `None` leaves the field as it is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePatch {
    pub description: Option<String>,
    pub category: Option<Category>,
    pub severity: Option<Severity>,
    pub status: Option<bool>,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.category.is_none() && self.severity.is_none() && self.status.is_none()
    }
}

/// Ordered, in-memory log of issues
///
/// Row numbers used by the public API are 1-based and positional: deleting
/// row 2 renumbers everything after it.
pub struct IssueStore {
    issues: Vec<Issue>,
    clock: Box<dyn Clock>,
    layout: ExportLayout,
}

impl Default for IssueStore {
    fn default() -> Self {
        Self::with_clock(SystemClock::default())
    }
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store stamping times from `clock`
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            issues: Vec::new(),
            clock: Box::new(clock),
            layout: ExportLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: ExportLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Empty store using the configured clock and sheet layout
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_clock(config.clock()?).with_layout(config.layout()))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issue at a 1-based row number
    pub fn get(&self, row: usize) -> Option<&Issue> {
        row.checked_sub(1).and_then(|idx| self.issues.get(idx))
    }

    /// Editable projection of the whole log, delete flags cleared
    pub fn rows(&self) -> Vec<IssueRow> {
        self.issues.iter().map(IssueRow::from).collect()
    }

    /// Issues matching every filter, paired with their row numbers
    pub fn list(&self, filters: &[Filter]) -> Vec<(usize, &Issue)> {
        self.issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| filters.iter().all(|f| f.matches(issue)))
            .map(|(idx, issue)| (idx + 1, issue))
            .collect()
    }

    /// Aggregate counts over the current log
    pub fn metrics(&self) -> Metrics {
        let total = self.issues.len();
        let resolved = self.issues.iter().filter(|i| i.is_closed()).count();
        let critical_or_high = self.issues.iter().filter(|i| i.is_critical_or_high()).count();

        Metrics {
            total,
            pending: total - resolved,
            resolved,
            critical_or_high,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Log a new open issue
    pub fn create(&mut self, description: &str, category: Category, severity: Severity) -> Result<&Issue> {
        let description = description.trim();
        if description.is_empty() {
            return Err(StoreError::EmptyDescription.into());
        }

        let issue = Issue {
            status: false,
            time_found: self.clock.now(),
            description: description.to_string(),
            category,
            severity,
            time_resolved: String::new(),
        };

        info!(
            row = self.issues.len() + 1,
            category = %category,
            severity = %severity,
            "Logged issue"
        );

        self.issues.push(issue);
        Ok(&self.issues[self.issues.len() - 1])
    }

    /// Commit an edited table
    ///
    /// `rows` must line up with the current log, one per issue. Rows flagged
    /// for deletion are dropped. Closing an issue stamps its resolved time if
    /// it has none, and reopening clears it. Found times always come from the
    /// stored issue and descriptions are stored trimmed. Nothing changes if
    /// any row is rejected.
    pub fn apply_edits(&mut self, rows: Vec<IssueRow>) -> Result<()> {
        if rows.len() != self.issues.len() {
            return Err(StoreError::RowCountMismatch {
                expected: self.issues.len(),
                got: rows.len(),
            }
            .into());
        }

        let mut now: Option<String> = None;
        let mut next = Vec::with_capacity(rows.len());
        let mut deleted = 0;

        for (current, row) in self.issues.iter().zip(rows) {
            if row.delete {
                deleted += 1;
                continue;
            }

            if row.description.trim().is_empty() {
                return Err(StoreError::EmptyDescription.into());
            }

            let time_resolved = match (row.status, current.time_resolved.is_empty()) {
                (false, _) => String::new(),
                (true, false) => current.time_resolved.clone(),
                (true, true) => now.get_or_insert_with(|| self.clock.now()).clone(),
            };

            next.push(Issue {
                status: row.status,
                time_found: current.time_found.clone(),
                description: row.description.trim().to_string(),
                category: row.category,
                severity: row.severity,
                time_resolved,
            });
        }

        info!(kept = next.len(), deleted, "Applied table edits");
        self.issues = next;
        Ok(())
    }

    /// Close or reopen the given rows
    ///
    /// Returns how many issues changed status; repeated rows and rows already
    /// in the target state are not counted.
    pub fn set_status(&mut self, rows: &[usize], closed: bool) -> Result<usize> {
        let mut edited = self.rows();
        for &row in rows {
            let idx = self.index_of(row)?;
            edited[idx].status = closed;
        }

        let changed = edited
            .iter()
            .zip(&self.issues)
            .filter(|(row, issue)| row.status != issue.status)
            .count();
        self.apply_edits(edited)?;
        Ok(changed)
    }

    /// Remove the given rows, returning how many were removed
    pub fn delete_rows(&mut self, rows: &[usize]) -> Result<usize> {
        let mut edited = self.rows();
        for &row in rows {
            let idx = self.index_of(row)?;
            edited[idx].delete = true;
        }

        let count = edited.iter().filter(|r| r.delete).count();
        self.apply_edits(edited)?;
        Ok(count)
    }

    /// Apply a patch to one row
    pub fn edit_row(&mut self, row: usize, patch: IssuePatch) -> Result<()> {
        let idx = self.index_of(row)?;
        let mut edited = self.rows();
        let target = &mut edited[idx];

        if let Some(description) = patch.description {
            target.description = description;
        }
        if let Some(category) = patch.category {
            target.category = category;
        }
        if let Some(severity) = patch.severity {
            target.severity = severity;
        }
        if let Some(status) = patch.status {
            target.status = status;
        }

        self.apply_edits(edited)
    }

    /// Replace the log with the rows of a decoded table
    ///
    /// Returns the number of imported issues. The log is untouched on error.
    pub fn import_table(&mut self, table: &Table) -> Result<usize> {
        let now = self.clock.now();
        let issues = xlsx::parse_issues(table, &now)?;

        let count = issues.len();
        info!(replaced = self.issues.len(), imported = count, "Imported issue log");
        self.issues = issues;
        Ok(count)
    }

    /// Replace the log with the contents of an .xlsx workbook
    pub fn import_xlsx(&mut self, bytes: &[u8]) -> Result<usize> {
        let table = xlsx::read_table(bytes)?;
        self.import_table(&table)
    }

    /// Render the log as an .xlsx workbook
    pub fn export(&self) -> Result<Vec<u8>> {
        debug!(rows = self.issues.len(), "Exporting issue log");
        xlsx::write_issues(&self.issues, &self.layout).context("Failed to render workbook")
    }

    /// Stamp for naming an export file
    pub fn now(&self) -> String {
        self.clock.now()
    }

    fn index_of(&self, row: usize) -> Result<usize> {
        if row == 0 || row > self.issues.len() {
            return Err(StoreError::RowOutOfRange {
                row,
                len: self.issues.len(),
            }
            .into());
        }
        Ok(row - 1)
    }
}
