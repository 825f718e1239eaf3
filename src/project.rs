//! Project records and the per-project mutations.
//!
//! A project owns its tasks and activity log. Lifecycle flags (completed, postponed,
//! cancelled) are independent optional pairs: setting one never clears another, and
//! resuming clears completion and postponement only.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TrackerError;
use crate::fields::Priority;
use crate::task::{format_date, Activity, Task};

/// A tracked project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Priority::is_unset")]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stall_period: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postponed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postponement_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<String>,
}

impl Project {
    /// Create a project with no tasks, no activities and no lifecycle flags.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        stall_period: i64,
    ) -> Self {
        Project {
            name: name.into(),
            description: description.into(),
            priority,
            stall_period: Some(stall_period),
            tasks: Vec::new(),
            activities: Vec::new(),
            completed: None,
            completion_date: None,
            postponed: None,
            postponement_date: None,
            cancelled: None,
            cancellation_date: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }

    pub fn is_postponed(&self) -> bool {
        self.postponed.unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false)
    }

    pub fn set_stall_period(&mut self, days: i64) {
        self.stall_period = Some(days);
    }

    pub fn add_activity(&mut self, description: impl Into<String>, today: NaiveDate) {
        self.activities.push(Activity::new(description, today));
    }

    pub fn add_task(&mut self, description: impl Into<String>, today: NaiveDate) {
        self.tasks.push(Task::new(description, today));
    }

    /// Mark the task at `index` complete.
    pub fn complete_task(&mut self, index: usize, today: NaiveDate) -> Result<(), TrackerError> {
        let task = self.tasks.get_mut(index).ok_or(TrackerError::InvalidTaskIndex)?;
        task.complete(today);
        Ok(())
    }

    /// Remove the task at `index`. Every later task moves down one position.
    pub fn delete_task(&mut self, index: usize) -> Result<Task, TrackerError> {
        if index >= self.tasks.len() {
            return Err(TrackerError::InvalidTaskIndex);
        }
        Ok(self.tasks.remove(index))
    }

    pub fn mark_completed(&mut self, today: NaiveDate) {
        self.completed = Some(true);
        self.completion_date = Some(format_date(today));
    }

    pub fn mark_postponed(&mut self, today: NaiveDate) {
        self.postponed = Some(true);
        self.postponement_date = Some(format_date(today));
    }

    pub fn mark_cancelled(&mut self, today: NaiveDate) {
        self.cancelled = Some(true);
        self.cancellation_date = Some(format_date(today));
    }

    /// Clear completion and postponement. Cancellation is left in place.
    pub fn resume(&mut self) {
        self.completed = None;
        self.completion_date = None;
        self.postponed = None;
        self.postponement_date = None;
    }
}

/// Read an explicit `null` as the field's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a task index taken from a URL segment.
pub fn parse_task_index(raw: &str) -> Result<usize, TrackerError> {
    raw.trim().parse::<usize>().map_err(|_| TrackerError::InvalidTaskIndex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn with_tasks(names: &[&str]) -> Project {
        let mut p = Project::new("P", "", Priority::High, 3);
        for n in names {
            p.add_task(*n, day());
        }
        p
    }

    #[test]
    fn test_delete_task_shifts_indices() {
        let mut p = with_tasks(&["a", "b", "c"]);
        let removed = p.delete_task(1).unwrap();
        assert_eq!(removed.description, "b");
        assert_eq!(p.tasks.len(), 2);

        // Index 1 now addresses what used to be index 2.
        p.complete_task(1, day()).unwrap();
        assert_eq!(p.tasks[1].description, "c");
        assert!(p.tasks[1].completed);
        assert!(!p.tasks[0].completed);
        assert!(matches!(p.complete_task(2, day()), Err(TrackerError::InvalidTaskIndex)));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let mut p = with_tasks(&["only"]);
        assert!(matches!(p.delete_task(1), Err(TrackerError::InvalidTaskIndex)));
        assert!(matches!(p.complete_task(5, day()), Err(TrackerError::InvalidTaskIndex)));
        assert_eq!(p.tasks.len(), 1);
    }

    #[test]
    fn test_parse_task_index() {
        assert_eq!(parse_task_index("2").unwrap(), 2);
        assert!(parse_task_index("-1").is_err());
        assert!(parse_task_index("two").is_err());
        assert!(parse_task_index("").is_err());
    }

    #[test]
    fn test_lifecycle_flags_are_independent() {
        let mut p = with_tasks(&[]);
        p.mark_completed(day());
        p.mark_postponed(day());
        p.mark_cancelled(day());
        assert!(p.is_completed() && p.is_postponed() && p.is_cancelled());
        assert_eq!(p.completion_date.as_deref(), Some("2024-06-10"));
    }

    #[test]
    fn test_resume_keeps_cancellation() {
        let mut p = with_tasks(&[]);
        p.mark_completed(day());
        p.mark_postponed(day());
        p.mark_cancelled(day());
        p.resume();
        assert!(!p.is_completed());
        assert!(!p.is_postponed());
        assert!(p.is_cancelled());
        assert_eq!(p.completion_date, None);
        assert_eq!(p.postponement_date, None);
        assert_eq!(p.cancellation_date.as_deref(), Some("2024-06-10"));
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let p: Project = serde_json::from_str(
            r#"{"name": null, "description": null, "priority": null, "tasks": null, "activities": null}"#,
        )
        .unwrap();
        assert_eq!(p.name, "");
        assert!(p.tasks.is_empty() && p.activities.is_empty());
        assert_eq!(p.priority.rank(), 4);
    }

    #[test]
    fn test_absent_priority_stays_absent() {
        let p: Project = serde_json::from_str(r#"{"name": "Quiet", "tasks": [], "activities": []}"#).unwrap();
        assert_eq!(p.priority, Priority::Unset);
        assert_eq!(p.priority.rank(), Priority::Low.rank());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("priority").is_none());
    }

    #[test]
    fn test_resumed_flags_are_dropped_from_json() {
        let mut p = with_tasks(&[]);
        p.mark_postponed(day());
        p.resume();
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("postponed").is_none());
        assert!(json.get("postponement_date").is_none());
    }
}
