//! Derived project status: progress, stall detection, and dashboard grouping.
//!
//! Everything here is a pure function of a loaded `Database` and the date passed in.
//! No I/O happens in this module.

use chrono::NaiveDate;

use crate::config::Config;
use crate::db::Database;
use crate::fields::Group;
use crate::project::Project;
use crate::task::parse_date;

/// Percentage of completed tasks, rounded down. A project with no tasks is at 0.
pub fn progress(project: &Project) -> u8 {
    let total = project.tasks.len();
    if total == 0 {
        return 0;
    }
    let done = project.tasks.iter().filter(|t| t.completed).count();
    (done * 100 / total) as u8
}

/// Lifecycle group. `cancelled` wins over `postponed`; `completed` plays no part.
pub fn group_of(project: &Project) -> Group {
    if project.is_cancelled() {
        Group::Cancelled
    } else if project.is_postponed() {
        Group::Postponed
    } else {
        Group::Active
    }
}

/// A project annotated with its derived fields, ready for display.
#[derive(Debug, Clone)]
pub struct ProjectSummary<'a> {
    pub id: &'a str,
    pub project: &'a Project,
    pub progress: u8,
    pub stalled: bool,
    pub stall_period: i64,
}

/// Projects split into lifecycle groups, each ordered by priority.
#[derive(Debug, Default)]
pub struct Dashboard<'a> {
    pub active: Vec<ProjectSummary<'a>>,
    pub postponed: Vec<ProjectSummary<'a>>,
    pub cancelled: Vec<ProjectSummary<'a>>,
}

impl<'a> Dashboard<'a> {
    pub fn group(&self, group: Group) -> &[ProjectSummary<'a>] {
        match group {
            Group::Active => &self.active,
            Group::Postponed => &self.postponed,
            Group::Cancelled => &self.cancelled,
        }
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.postponed.len() + self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable sort by priority rank; equal ranks keep their incoming order.
pub fn sort_by_priority(items: &mut [ProjectSummary<'_>]) {
    items.sort_by_key(|s| s.project.priority.rank());
}

/// Stall and progress rules, parameterised by the configured default stall period.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    default_stall_period: i64,
}

impl Policy {
    pub fn new(default_stall_period: i64) -> Self {
        Policy { default_stall_period }
    }

    pub fn from_config(config: &Config) -> Self {
        Policy::new(config.default_stall_period)
    }

    /// The project's own stall period, or the default when it has none.
    pub fn stall_period(&self, project: &Project) -> i64 {
        project.stall_period.unwrap_or(self.default_stall_period)
    }

    /// A project is stalled when neither its latest activity nor any of its tasks falls
    /// inside the stall window. Unparseable dates never count as recent.
    pub fn is_stalled(&self, project: &Project, today: NaiveDate) -> bool {
        let period = self.stall_period(project);
        let recent = |date: NaiveDate| (today - date).num_days() < period;

        let last_activity = project
            .activities
            .last()
            .and_then(|a| parse_date(a.date.as_deref()));
        if last_activity.is_some_and(recent) {
            return false;
        }

        !project
            .tasks
            .iter()
            .filter_map(|t| t.last_touched())
            .any(recent)
    }

    pub fn summarize<'a>(&self, id: &'a str, project: &'a Project, today: NaiveDate) -> ProjectSummary<'a> {
        ProjectSummary {
            id,
            project,
            progress: progress(project),
            stalled: self.is_stalled(project, today),
            stall_period: self.stall_period(project),
        }
    }

    /// Group every project and order each group by priority.
    pub fn dashboard<'a>(&self, db: &'a Database, today: NaiveDate) -> Dashboard<'a> {
        let mut dash = Dashboard::default();
        for (id, project) in db.ordered() {
            let summary = self.summarize(id, project, today);
            match group_of(project) {
                Group::Active => dash.active.push(summary),
                Group::Postponed => dash.postponed.push(summary),
                Group::Cancelled => dash.cancelled.push(summary),
            }
        }
        sort_by_priority(&mut dash.active);
        sort_by_priority(&mut dash.postponed);
        sort_by_priority(&mut dash.cancelled);
        dash
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::fields::Priority;
    use crate::task::{format_date, Activity, Task};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn ago(days: i64) -> NaiveDate {
        today() - Duration::days(days)
    }

    fn project(priority: &str) -> Project {
        Project::new("p", "", Priority::from(priority), 3)
    }

    fn task(done: bool) -> Task {
        let mut t = Task::new("t", today());
        if done {
            t.complete(today());
        }
        t
    }

    #[test]
    fn test_progress_empty_is_zero() {
        assert_eq!(progress(&project("High")), 0);
    }

    #[test]
    fn test_progress_all_done() {
        let mut p = project("High");
        p.tasks = vec![task(true), task(true)];
        assert_eq!(progress(&p), 100);
    }

    #[test]
    fn test_progress_rounds_down() {
        let mut p = project("High");
        p.tasks = vec![task(true), task(false), task(false)];
        assert_eq!(progress(&p), 33);
        p.tasks = vec![task(true), task(true), task(false)];
        assert_eq!(progress(&p), 66);
    }

    #[test]
    fn test_progress_integer_arithmetic() {
        let mut p = project("High");
        p.tasks = (0..100).map(|i| task(i < 29)).collect();
        assert_eq!(progress(&p), 29);
    }

    #[test]
    fn test_activity_today_is_not_stalled() {
        let mut p = project("High");
        p.add_activity("worked on it", today());
        assert!(!Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_old_activity_and_old_task_is_stalled() {
        let mut p = project("High");
        p.add_activity("long ago", ago(10));
        p.add_task("old task", ago(10));
        assert!(Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_recent_task_rescues_project() {
        let mut p = project("High");
        p.add_activity("long ago", ago(10));
        p.add_task("old task", ago(10));
        p.add_task("new task", ago(1));
        assert!(!Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_recent_completion_rescues_old_task() {
        let mut p = project("High");
        p.add_task("old task", ago(30));
        p.tasks[0].complete(ago(2));
        assert!(!Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let mut p = project("High");
        p.add_activity("edge", ago(2));
        assert!(!Policy::default().is_stalled(&p, today()));
        p.activities[0].date = Some(format_date(ago(3)));
        assert!(Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_only_latest_activity_counts() {
        let mut p = project("High");
        p.activities.push(Activity::new("recent", today()));
        p.activities.push(Activity {
            date: Some("garbage".into()),
            description: "bad date".into(),
        });
        assert!(Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_unparseable_dates_never_rescue() {
        let mut p = project("High");
        p.activities.push(Activity {
            date: None,
            description: "undated".into(),
        });
        p.tasks.push(Task {
            description: "bad".into(),
            completed: false,
            created_date: Some("not-a-date".into()),
            completed_date: None,
        });
        assert!(Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_empty_project_is_stalled() {
        assert!(Policy::default().is_stalled(&project("Low"), today()));
    }

    #[test]
    fn test_non_positive_stall_period_always_stalls_past_dates() {
        let mut p = project("High");
        p.stall_period = Some(0);
        p.add_activity("today", today());
        assert!(Policy::default().is_stalled(&p, today()));
    }

    #[test]
    fn test_missing_stall_period_uses_default() {
        let mut p = project("High");
        p.stall_period = None;
        p.add_activity("a while back", ago(5));
        assert!(Policy::new(3).is_stalled(&p, today()));
        assert!(!Policy::new(7).is_stalled(&p, today()));
        assert_eq!(Policy::new(7).stall_period(&p), 7);
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let mut db = Database::default();
        for (name, prio) in [("a", "Low"), ("b", "High"), ("c", "Medium"), ("d", "High")] {
            let mut p = project(prio);
            p.name = name.into();
            db.create_project(p);
        }
        let dash = Policy::default().dashboard(&db, today());
        let names: Vec<&str> = dash.active.iter().map(|s| s.project.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_unknown_priority_sorts_last() {
        let mut db = Database::default();
        db.create_project(project("Someday"));
        db.create_project(project("Low"));
        let dash = Policy::default().dashboard(&db, today());
        assert_eq!(dash.active[0].id, "2");
        assert_eq!(dash.active[1].id, "1");
    }

    #[test]
    fn test_grouping_precedence() {
        let mut db = Database::default();

        let mut both = project("High");
        both.mark_postponed(today());
        both.mark_cancelled(today());
        let mut postponed = project("High");
        postponed.mark_postponed(today());
        let mut completed = project("High");
        completed.mark_completed(today());

        let both_id = db.create_project(both);
        let postponed_id = db.create_project(postponed);
        let completed_id = db.create_project(completed);

        let dash = Policy::default().dashboard(&db, today());
        assert_eq!(dash.cancelled.len(), 1);
        assert_eq!(dash.cancelled[0].id, both_id);
        assert_eq!(dash.postponed[0].id, postponed_id);
        assert_eq!(dash.active[0].id, completed_id);
        assert_eq!(dash.len(), 3);
        assert!(!dash.is_empty());
        assert!(Policy::default().dashboard(&Database::default(), today()).is_empty());
    }

    #[test]
    fn test_missing_priority_sorts_with_low_and_null_sorts_last() {
        let mut db = Database::default();
        let null_id = db.create_project(Project {
            priority: Priority::Invalid(serde_json::Value::Null),
            ..project("")
        });
        let unset_id = db.create_project(Project {
            priority: Priority::Unset,
            ..project("")
        });
        let low_id = db.create_project(project("Low"));
        let high_id = db.create_project(project("High"));

        let dash = Policy::default().dashboard(&db, today());
        let ids: Vec<&str> = dash.active.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![high_id.as_str(), unset_id.as_str(), low_id.as_str(), null_id.as_str()]
        );
    }
}
