// Row filtering for the issue table

use crate::models::{Issue, parse_status_label};
use eyre::{Result, eyre};
use std::str::FromStr;

/// Filter for listing issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column to filter on
    pub field: FilterField,
    /// Comparison operator
    pub op: FilterOp,
    /// Value to compare against
    pub value: String,
}

/// Columns that can be filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Status,
    Category,
    Severity,
    Description,
}

/// Comparison operators for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,       // =
    Ne,       // !=
    Contains, // ~
}

impl Filter {
    pub fn new(field: FilterField, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }

    /// Case-insensitive match against one issue
    pub fn matches(&self, issue: &Issue) -> bool {
        let wanted = self.value.trim().to_lowercase();

        if self.field == FilterField::Status && self.op != FilterOp::Contains {
            // "open"/"closed" compare as flags so any casing works
            let hit = parse_status_label(&wanted) == issue.is_closed();
            return if self.op == FilterOp::Eq { hit } else { !hit };
        }

        let actual = match self.field {
            FilterField::Status => issue.status_label(),
            FilterField::Category => issue.category.as_str(),
            FilterField::Severity => issue.severity.as_str(),
            FilterField::Description => issue.description.as_str(),
        }
        .to_lowercase();

        match self.op {
            FilterOp::Eq => actual == wanted,
            FilterOp::Ne => actual != wanted,
            FilterOp::Contains => actual.contains(&wanted),
        }
    }
}

impl FromStr for FilterField {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "status" => Ok(FilterField::Status),
            "category" => Ok(FilterField::Category),
            "severity" => Ok(FilterField::Severity),
            "description" | "desc" => Ok(FilterField::Description),
            other => Err(eyre!(
                "Unknown filter field: {} (expected status, category, severity or description)",
                other
            )),
        }
    }
}

impl FromStr for Filter {
    type Err = eyre::Report;

    /// Parse `field=value`, `field!=value` or `field~value`
    fn from_str(s: &str) -> Result<Self> {
        let (field, op, value) = if let Some((field, value)) = s.split_once("!=") {
            (field, FilterOp::Ne, value)
        } else if let Some((field, value)) = s.split_once('=') {
            (field, FilterOp::Eq, value)
        } else if let Some((field, value)) = s.split_once('~') {
            (field, FilterOp::Contains, value)
        } else {
            return Err(eyre!("Invalid filter: {} (use field=value, field!=value or field~value)", s));
        };

        Ok(Filter::new(field.parse()?, op, value.trim()))
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOp::Eq => write!(f, "="),
            FilterOp::Ne => write!(f, "!="),
            FilterOp::Contains => write!(f, "~"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Severity};

    fn issue() -> Issue {
        Issue {
            status: true,
            time_found: "2025-01-06 09:15".to_string(),
            description: "Export button crashes the page".to_string(),
            category: Category::UiUxDefect,
            severity: Severity::High,
            time_resolved: "2025-01-06 11:00".to_string(),
        }
    }

    #[test]
    fn test_filter_parse() {
        let filter: Filter = "severity=High".parse().unwrap();
        assert_eq!(filter.field, FilterField::Severity);
        assert_eq!(filter.op, FilterOp::Eq);
        assert_eq!(filter.value, "High");

        let filter: Filter = "status!=closed".parse().unwrap();
        assert_eq!(filter.field, FilterField::Status);
        assert_eq!(filter.op, FilterOp::Ne);

        let filter: Filter = "desc~crash".parse().unwrap();
        assert_eq!(filter.field, FilterField::Description);
        assert_eq!(filter.op, FilterOp::Contains);
    }

    #[test]
    fn test_filter_parse_errors() {
        assert!("severity".parse::<Filter>().is_err());
        assert!("owner=me".parse::<Filter>().is_err());
    }

    #[test]
    fn test_filter_matches() {
        let issue = issue();
        assert!(Filter::new(FilterField::Severity, FilterOp::Eq, "high").matches(&issue));
        assert!(Filter::new(FilterField::Category, FilterOp::Eq, "UI/UX Defect").matches(&issue));
        assert!(Filter::new(FilterField::Description, FilterOp::Contains, "CRASH").matches(&issue));
        assert!(!Filter::new(FilterField::Severity, FilterOp::Ne, "High").matches(&issue));
    }

    #[test]
    fn test_status_filter_uses_flag() {
        let closed = issue();
        let mut open = issue();
        open.status = false;

        let only_closed = Filter::new(FilterField::Status, FilterOp::Eq, "closed");
        assert!(only_closed.matches(&closed));
        assert!(!only_closed.matches(&open));

        let not_closed = Filter::new(FilterField::Status, FilterOp::Ne, "Closed");
        assert!(not_closed.matches(&open));
        assert!(!not_closed.matches(&closed));
    }

    #[test]
    fn test_filter_op_display() {
        assert_eq!(FilterOp::Eq.to_string(), "=");
        assert_eq!(FilterOp::Ne.to_string(), "!=");
        assert_eq!(FilterOp::Contains.to_string(), "~");
    }
}
