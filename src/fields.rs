//! Enumerations and field types for project tracking.
//!
//! This module defines the structured values used to classify projects: the priority
//! ladder that drives dashboard ordering and the lifecycle groups projects are listed under.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Priority classification for project importance.
///
/// Stored as a plain string. Anything other than the three known levels is kept verbatim
/// so it survives a load/save round trip, and ranks after every known level. A value that
/// is not a string at all (`null`, a number) is kept as raw JSON and also ranks last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Priority {
    High,
    Medium,
    Low,
    Other(String),
    Invalid(Value),
    /// No `priority` key at all. Ranks as `Low` and is never written back.
    #[default]
    Unset,
}

impl Priority {
    /// Sort rank: `High=1 < Medium=2 < Low=3 < anything else=4`.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low | Priority::Unset => 3,
            Priority::Other(_) | Priority::Invalid(_) => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low | Priority::Unset => "Low",
            Priority::Other(s) => s,
            Priority::Invalid(_) => "-",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Priority::Unset)
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        match s.as_str() {
            "High" => Priority::High,
            "Medium" => Priority::Medium,
            "Low" => Priority::Low,
            _ => Priority::Other(s),
        }
    }
}

impl From<Value> for Priority {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Priority::from(s),
            other => Priority::Invalid(other),
        }
    }
}

impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        Priority::from(s.to_string())
    }
}

impl From<Priority> for Value {
    fn from(p: Priority) -> Self {
        match p {
            Priority::Other(s) => Value::String(s),
            Priority::Invalid(v) => v,
            known => Value::String(known.as_str().to_string()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard section a project is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Group {
    Active,
    Postponed,
    Cancelled,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Active, Group::Postponed, Group::Cancelled];

    pub fn title(self) -> &'static str {
        match self {
            Group::Active => "Active Projects",
            Group::Postponed => "Postponed Projects",
            Group::Cancelled => "Cancelled Projects",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
        assert!(Priority::Low.rank() < Priority::from("Urgent").rank());
    }

    #[test]
    fn test_unknown_priority_kept_verbatim() {
        let p: Priority = serde_json::from_str("\"someday\"").unwrap();
        assert_eq!(p, Priority::Other("someday".into()));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"someday\"");
    }

    #[test]
    fn test_priority_is_case_sensitive() {
        assert_eq!(Priority::from("high"), Priority::Other("high".into()));
        assert_eq!(Priority::from("High"), Priority::High);
    }

    #[test]
    fn test_non_string_priority_ranks_last_and_is_kept() {
        let p: Priority = serde_json::from_str("null").unwrap();
        assert_eq!(p, Priority::Invalid(Value::Null));
        assert_eq!(p.rank(), 4);
        assert_eq!(serde_json::to_string(&p).unwrap(), "null");

        let p: Priority = serde_json::from_str("2").unwrap();
        assert_eq!(p.rank(), 4);
        assert_eq!(serde_json::to_string(&p).unwrap(), "2");
    }

    #[test]
    fn test_unset_priority_ranks_as_low() {
        assert_eq!(Priority::default(), Priority::Unset);
        assert_eq!(Priority::Unset.rank(), Priority::Low.rank());
        assert_eq!(Priority::Unset.as_str(), "Low");
    }
}
