//! Server-rendered HTML pages.
//!
//! Pages are assembled with `format!` and every piece of user text goes through
//! `html_escape` before it is interpolated.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::fields::Group;
use crate::policy::{Dashboard, ProjectSummary};

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2em auto; max-width: 960px; color: #222; }
h1 a { color: inherit; text-decoration: none; }
section { margin-bottom: 2em; }
.project { border: 1px solid #ddd; border-radius: 6px; padding: 1em; margin-bottom: 1em; }
.project.stalled { border-color: #d9534f; }
.badge { font-size: 0.75em; padding: 2px 8px; border-radius: 10px; margin-left: 6px; background: #eee; }
.badge.stalled { background: #d9534f; color: #fff; }
.badge.done { background: #5cb85c; color: #fff; }
.priority-High { color: #c9302c; }
.priority-Medium { color: #ec971f; }
.priority-Low { color: #31b0d5; }
.bar { background: #eee; border-radius: 4px; height: 14px; width: 100%; }
.bar > div { background: #5cb85c; border-radius: 4px; height: 14px; }
.actions a { margin-right: 0.8em; font-size: 0.9em; }
ul.tasks li.completed { text-decoration: line-through; color: #888; }
.muted { color: #888; font-size: 0.85em; }
form label { display: block; margin-top: 0.8em; }
"#;

/// Wrap a page body in the shared document shell.
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <h1><a href="/">Project Tracker</a></h1>
{body}
</body>
</html>
"#,
        title = text(title),
    )
}

pub fn dashboard_page(dash: &Dashboard<'_>) -> String {
    let mut body = String::from(r#"    <p><a href="/add_project">+ Add project</a></p>
"#);
    for group in Group::ALL {
        body.push_str(&group_section(group, dash.group(group)));
    }
    layout("Projects", &body)
}

fn group_section(group: Group, projects: &[ProjectSummary<'_>]) -> String {
    let mut out = format!("    <section>\n        <h2>{}</h2>\n", group.title());
    if projects.is_empty() {
        out.push_str("        <p class=\"muted\">None.</p>\n");
    }
    for summary in projects {
        out.push_str(&project_card(summary));
    }
    out.push_str("    </section>\n");
    out
}

fn project_card(s: &ProjectSummary<'_>) -> String {
    let p = s.project;
    let id = attr(s.id);
    let mut badges = String::new();
    if s.stalled {
        badges.push_str(r#"<span class="badge stalled">Stalled</span>"#);
    }
    if let Some(date) = p.completion_date.as_deref().filter(|_| p.is_completed()) {
        badges.push_str(&format!(r#"<span class="badge done">Completed {}</span>"#, text(date)));
    }
    if let Some(date) = p.postponement_date.as_deref().filter(|_| p.is_postponed()) {
        badges.push_str(&format!(r#"<span class="badge">Postponed {}</span>"#, text(date)));
    }
    if let Some(date) = p.cancellation_date.as_deref().filter(|_| p.is_cancelled()) {
        badges.push_str(&format!(r#"<span class="badge">Cancelled {}</span>"#, text(date)));
    }

    let mut tasks = String::new();
    for (index, task) in p.tasks.iter().enumerate() {
        let class = if task.completed { " class=\"completed\"" } else { "" };
        let complete_link = if task.completed {
            String::new()
        } else {
            format!(r#" <a href="/complete_task/{id}/{index}">complete</a>"#)
        };
        tasks.push_str(&format!(
            "                <li{class}>{}{complete_link} <a href=\"/delete_task/{id}/{index}\">delete</a></li>\n",
            text(&task.description),
        ));
    }

    let mut activities = String::new();
    for activity in p.activities.iter().rev() {
        activities.push_str(&format!(
            "                <li><span class=\"muted\">{}</span> {}</li>\n",
            text(activity.date.as_deref().unwrap_or("-")),
            text(&activity.description),
        ));
    }

    format!(
        r#"        <div class="project{stalled_class}">
            <h3>{name} <span class="priority-{prio_class}">[{priority}]</span>{badges}</h3>
            <p>{description}</p>
            <div class="bar"><div style="width: {progress}%"></div></div>
            <p class="muted">{progress}% complete &middot; stall period {stall_period} days</p>
            <h4>Tasks</h4>
            <ul class="tasks">
{tasks}            </ul>
            <h4>Activity</h4>
            <ul>
{activities}            </ul>
            <div class="actions">
                <a href="/add_task/{id}">Add task</a>
                <a href="/add_activity/{id}">Log activity</a>
                <a href="/edit_stall_period/{id}">Edit stall period</a>
                <a href="/complete_project/{id}">Complete</a>
                <a href="/postpone_project/{id}">Postpone</a>
                <a href="/cancel_project/{id}">Cancel</a>
                <a href="/resume_project/{id}">Resume</a>
                <a href="/delete_project/{id}" onclick="return confirm('Delete this project?')">Delete</a>
            </div>
        </div>
"#,
        stalled_class = if s.stalled { " stalled" } else { "" },
        name = text(&p.name),
        prio_class = attr(p.priority.as_str()),
        priority = text(p.priority.as_str()),
        description = text(&p.description),
        progress = s.progress,
        stall_period = s.stall_period,
    )
}

pub fn add_project_page(default_stall_period: i64) -> String {
    let body = format!(
        r#"    <h2>Add project</h2>
    <form method="post" action="/add_project">
        <label>Name <input type="text" name="project_name" required></label>
        <label>Description <textarea name="project_description"></textarea></label>
        <label>Priority
            <select name="project_priority">
                <option value="High">High</option>
                <option value="Medium" selected>Medium</option>
                <option value="Low">Low</option>
            </select>
        </label>
        <label>Stall period (days) <input type="number" name="stall_period" value="{default_stall_period}"></label>
        <p><button type="submit">Add project</button></p>
    </form>
"#
    );
    layout("Add project", &body)
}

pub fn edit_stall_period_page(project_id: &str, project_name: &str, current: i64) -> String {
    let body = format!(
        r#"    <h2>Edit stall period for {name}</h2>
    <form method="post" action="/edit_stall_period/{id}">
        <label>Stall period (days) <input type="number" name="stall_period" value="{current}" required></label>
        <p><button type="submit">Save</button></p>
    </form>
"#,
        name = text(project_name),
        id = attr(project_id),
    );
    layout("Edit stall period", &body)
}

pub fn add_activity_page(project_id: &str, project_name: &str) -> String {
    let body = format!(
        r#"    <h2>Log activity for {name}</h2>
    <form method="post" action="/add_activity/{id}">
        <label>What happened? <textarea name="activity_description" required></textarea></label>
        <p><button type="submit">Log activity</button></p>
    </form>
"#,
        name = text(project_name),
        id = attr(project_id),
    );
    layout("Log activity", &body)
}

pub fn add_task_page(project_id: &str, project_name: &str) -> String {
    let body = format!(
        r#"    <h2>Add task to {name}</h2>
    <form method="post" action="/add_task/{id}">
        <label>Task <input type="text" name="task_description" required></label>
        <p><button type="submit">Add task</button></p>
    </form>
"#,
        name = text(project_name),
        id = attr(project_id),
    );
    layout("Add task", &body)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::Database;
    use crate::fields::Priority;
    use crate::policy::Policy;
    use crate::project::Project;

    #[test]
    fn test_dashboard_escapes_user_text() {
        let mut db = Database::default();
        let mut p = Project::new("<script>x</script>", "a & b", Priority::High, 3);
        p.add_task("<b>bold</b>", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        db.create_project(p);
        let html = dashboard_page(&Policy::default().dashboard(&db, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("/complete_task/1/0"));
    }

    #[test]
    fn test_empty_dashboard_lists_every_group() {
        let db = Database::default();
        let html = dashboard_page(&Policy::default().dashboard(&db, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(html.contains("Active Projects"));
        assert!(html.contains("Postponed Projects"));
        assert!(html.contains("Cancelled Projects"));
    }
}
