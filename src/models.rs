// Data models for the issue log

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label written to the Status column for a closed issue
pub const STATUS_CLOSED: &str = "Closed";
/// Label written to the Status column for an open issue
pub const STATUS_OPEN: &str = "Open";

/// One logged testing issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// `true` once the issue is closed
    pub status: bool,
    pub time_found: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    /// Empty while the issue is open
    pub time_resolved: String,
}

impl Issue {
    pub fn is_closed(&self) -> bool {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.status)
    }

    pub fn is_critical_or_high(&self) -> bool {
        matches!(self.severity, Severity::High | Severity::Critical)
    }
}

/// Map a status flag to its spreadsheet label
pub fn status_label(closed: bool) -> &'static str {
    if closed { STATUS_CLOSED } else { STATUS_OPEN }
}

/// Map a spreadsheet label to a status flag; anything other than "Closed" is open
pub fn parse_status_label(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case(STATUS_CLOSED)
}

/// Table-view projection of an issue plus the transient delete flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRow {
    pub delete: bool,
    pub status: bool,
    pub time_found: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub time_resolved: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            delete: false,
            status: issue.status,
            time_found: issue.time_found.clone(),
            description: issue.description.clone(),
            category: issue.category,
            severity: issue.severity,
            time_resolved: issue.time_resolved.clone(),
        }
    }
}

/// Summary counts over the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    pub critical_or_high: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?} (expected one of: {expected})")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseLabelError {
    fn new(kind: &'static str, value: &str, labels: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: labels.join(", "),
        }
    }
}

/// Loose label comparison: case-insensitive, ignoring spaces, '-', '_' and '/'
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '/'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "Functional Bug")]
    FunctionalBug,
    #[serde(rename = "UI/UX Defect")]
    UiUxDefect,
    #[serde(rename = "Data Integrity")]
    DataIntegrity,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    Performance,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::FunctionalBug,
        Category::UiUxDefect,
        Category::DataIntegrity,
        Category::FeatureRequest,
        Category::Performance,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FunctionalBug => "Functional Bug",
            Category::UiUxDefect => "UI/UX Defect",
            Category::DataIntegrity => "Data Integrity",
            Category::FeatureRequest => "Feature Request",
            Category::Performance => "Performance",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Category::ALL
            .into_iter()
            .find(|c| normalize_label(c.as_str()) == wanted)
            .ok_or_else(|| {
                let labels: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                ParseLabelError::new("category", s, &labels)
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Severity::ALL
            .into_iter()
            .find(|sev| normalize_label(sev.as_str()) == wanted)
            .ok_or_else(|| {
                let labels: Vec<&str> = Severity::ALL.iter().map(|s| s.as_str()).collect();
                ParseLabelError::new("severity", s, &labels)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity, status: bool) -> Issue {
        Issue {
            status,
            time_found: "2025-01-06 09:15".to_string(),
            description: "Login button unresponsive".to_string(),
            category: Category::FunctionalBug,
            severity,
            time_resolved: if status { "2025-01-06 10:00".to_string() } else { String::new() },
        }
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&Category::UiUxDefect).unwrap();
        assert_eq!(json, "\"UI/UX Defect\"");

        let parsed: Category = serde_json::from_str("\"Feature Request\"").unwrap();
        assert_eq!(parsed, Category::FeatureRequest);
    }

    #[test]
    fn test_category_from_str_is_loose() {
        assert_eq!("UI/UX Defect".parse::<Category>().unwrap(), Category::UiUxDefect);
        assert_eq!("ui-ux-defect".parse::<Category>().unwrap(), Category::UiUxDefect);
        assert_eq!("functional_bug".parse::<Category>().unwrap(), Category::FunctionalBug);
        assert_eq!("performance".parse::<Category>().unwrap(), Category::Performance);
        assert!("Cosmetic".parse::<Category>().is_err());
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(" High ".parse::<Severity>().unwrap(), Severity::High);

        let err = "Urgent".parse::<Severity>().unwrap_err();
        assert!(err.to_string().contains("Low, Medium, High, Critical"));
    }

    #[test]
    fn test_defaults_match_first_options() {
        assert_eq!(Category::default(), Category::FunctionalBug);
        assert_eq!(Severity::default(), Severity::Low);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(true), "Closed");
        assert_eq!(status_label(false), "Open");
        assert!(parse_status_label("Closed"));
        assert!(parse_status_label(" closed "));
        assert!(!parse_status_label("Open"));
        assert!(!parse_status_label("Done"));
        assert!(!parse_status_label(""));
    }

    #[test]
    fn test_critical_or_high() {
        assert!(issue(Severity::Critical, false).is_critical_or_high());
        assert!(issue(Severity::High, true).is_critical_or_high());
        assert!(!issue(Severity::Medium, false).is_critical_or_high());
        assert!(!issue(Severity::Low, false).is_critical_or_high());
    }

    #[test]
    fn test_row_from_issue_clears_delete() {
        let row = IssueRow::from(&issue(Severity::Low, true));
        assert!(!row.delete);
        assert!(row.status);
        assert_eq!(row.time_resolved, "2025-01-06 10:00");
    }
}
