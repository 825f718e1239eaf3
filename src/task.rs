//! Task and activity records.
//!
//! Both carry their date stamps as the raw `YYYY-MM-DD` strings found in the data file.
//! A stamp that does not parse is kept as-is and simply ignored by the stall check.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date stamp format used for every date written to the data file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a date the way it is stored.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored date stamp. Missing or malformed stamps yield `None`.
pub fn parse_date(stamp: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(stamp?, DATE_FORMAT).ok()
}

/// A unit of work inside a project. Its position in the project's task list is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default)]
    pub completed_date: Option<String>,
}

impl Task {
    /// Create an open task stamped with the given creation date.
    pub fn new(description: impl Into<String>, today: NaiveDate) -> Self {
        Task {
            description: description.into(),
            completed: false,
            created_date: Some(format_date(today)),
            completed_date: None,
        }
    }

    /// Mark the task done. There is no way back.
    pub fn complete(&mut self, today: NaiveDate) {
        self.completed = true;
        self.completed_date = Some(format_date(today));
    }

    /// The date that best describes when this task last moved: its completion date if that
    /// parses, otherwise its creation date if that parses.
    pub fn last_touched(&self) -> Option<NaiveDate> {
        parse_date(self.completed_date.as_deref()).or_else(|| parse_date(self.created_date.as_deref()))
    }
}

/// A free-text log entry. Activities are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Activity {
    pub fn new(description: impl Into<String>, today: NaiveDate) -> Self {
        Activity {
            date: Some(format_date(today)),
            description: description.into(),
        }
    }
}
