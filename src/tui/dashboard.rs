//! Read-only terminal dashboard.
//!
//! Shows the same three lifecycle groups as the web dashboard, ordered the same way, with
//! a progress column, a stall marker and a detail popup listing a project's tasks and
//! activity log. `r` reloads the data file so changes made through the web app show up.

use std::io;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::config::Config;
use crate::db::{Database, FileStore, Store};
use crate::fields::{Group, Priority};
use crate::policy::Policy;
use crate::tui::colors::{priority_color, STALL_ORANGE};
use crate::tui::utils::centered_rect;

const BAR_WIDTH: usize = 10;

/// One line of the project list.
#[derive(Debug, Clone)]
enum ListRow {
    Header { group: Group, count: usize },
    Project(ProjectLine),
}

#[derive(Debug, Clone)]
struct ProjectLine {
    id: String,
    name: String,
    priority: Priority,
    progress: u8,
    stalled: bool,
    stall_period: i64,
    tasks_done: usize,
    tasks_total: usize,
}

/// Main application state for the terminal dashboard.
pub struct DashboardApp {
    store: FileStore,
    policy: Policy,
    db: Database,
    today: NaiveDate,
    rows: Vec<ListRow>,
    /// Row indices of the project lines, in display order.
    project_rows: Vec<usize>,
    selected: usize,
    list_state: ListState,
    show_detail: bool,
    status_message: String,
}

impl DashboardApp {
    /// Create a dashboard over the configured data file.
    pub fn new(config: &Config) -> Self {
        let mut app = DashboardApp {
            store: FileStore::new(&config.data_file),
            policy: Policy::from_config(config),
            db: Database::default(),
            today: Local::now().date_naive(),
            rows: Vec::new(),
            project_rows: Vec::new(),
            selected: 0,
            list_state: ListState::default(),
            show_detail: false,
            status_message: String::new(),
        };
        app.reload();
        app
    }

    /// Re-read the data file and rebuild the list, keeping the selection on the same
    /// project when it still exists.
    fn reload(&mut self) {
        let keep = self.selected_id().map(str::to_string);
        self.db = self.store.load();
        self.today = Local::now().date_naive();

        let dash = self.policy.dashboard(&self.db, self.today);
        self.rows.clear();
        self.project_rows.clear();
        for group in Group::ALL {
            let items = dash.group(group);
            self.rows.push(ListRow::Header { group, count: items.len() });
            for s in items {
                self.project_rows.push(self.rows.len());
                self.rows.push(ListRow::Project(ProjectLine {
                    id: s.id.to_string(),
                    name: s.project.name.clone(),
                    priority: s.project.priority.clone(),
                    progress: s.progress,
                    stalled: s.stalled,
                    stall_period: s.stall_period,
                    tasks_done: s.project.tasks.iter().filter(|t| t.completed).count(),
                    tasks_total: s.project.tasks.len(),
                }));
            }
        }

        self.selected = keep
            .and_then(|id| self.project_ids().position(|p| p == id))
            .unwrap_or(0);
        self.clamp_selection();
    }

    fn project_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.project_rows.iter().filter_map(|&i| match &self.rows[i] {
            ListRow::Project(line) => Some(line.id.as_str()),
            ListRow::Header { .. } => None,
        })
    }

    fn selected_line(&self) -> Option<&ProjectLine> {
        let row = *self.project_rows.get(self.selected)?;
        match &self.rows[row] {
            ListRow::Project(line) => Some(line),
            ListRow::Header { .. } => None,
        }
    }

    fn selected_id(&self) -> Option<&str> {
        self.selected_line().map(|l| l.id.as_str())
    }

    fn clamp_selection(&mut self) {
        if self.project_rows.is_empty() {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(self.project_rows.len() - 1);
            self.list_state.select(Some(self.project_rows[self.selected]));
        }
    }

    fn move_selection(&mut self, down: bool) {
        if self.project_rows.is_empty() {
            return;
        }
        if down {
            self.selected = (self.selected + 1).min(self.project_rows.len() - 1);
        } else {
            self.selected = self.selected.saturating_sub(1);
        }
        self.clamp_selection();
    }

    /// Apply one key press. Returns `true` when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        if self.show_detail {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.show_detail = false,
                _ => {}
            }
            return false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = 0;
                self.clamp_selection();
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.project_rows.len().saturating_sub(1);
                self.clamp_selection();
            }
            KeyCode::Enter => {
                if self.selected_line().is_some() {
                    self.show_detail = true;
                }
            }
            KeyCode::Char('r') => {
                self.reload();
                self.status_message = format!("Reloaded {} projects", self.project_rows.len());
            }
            _ => {}
        }
        false
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key));
                }
            }
        }
        Ok(false)
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Project list
                Constraint::Length(3), // Gauge
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_list(f, chunks[1]);
        self.render_gauge(f, chunks[2]);
        self.render_status_bar(f, chunks[3]);

        if self.show_detail {
            self.render_detail_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let header_text = vec![Line::from(vec![
            Span::styled("PROJECT TRACKER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{}  {}", self.store.path().display(), self.today),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| match row {
                ListRow::Header { group, count } => ListItem::new(Line::from(Span::styled(
                    format!("{} ({})", group.title(), count),
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                ))),
                ListRow::Project(line) => {
                    let stall = if line.stalled {
                        Span::styled("STALLED ", Style::default().fg(STALL_ORANGE).add_modifier(Modifier::BOLD))
                    } else {
                        Span::raw("        ")
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("  {:<5} ", line.id)),
                        Span::styled(
                            format!("{:<8} ", line.priority.as_str()),
                            Style::default().fg(priority_color(&line.priority)),
                        ),
                        Span::raw(format!("{} {:>3}%  ", progress_bar(line.progress), line.progress)),
                        Span::raw(format!("{:>7}  ", format!("{}/{}", line.tasks_done, line.tasks_total))),
                        stall,
                        Span::raw(line.name.clone()),
                    ]))
                }
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Projects"))
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_gauge(&self, f: &mut Frame, area: Rect) {
        let (title, percent, color) = match self.selected_line() {
            Some(line) => (line.name.clone(), line.progress, priority_color(&line.priority)),
            None => ("No projects".to_string(), 0, Color::DarkGray),
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(Style::default().fg(color))
            .percent(u16::from(percent));
        f.render_widget(gauge, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            format!(
                "Projects: {} | j/k: Move | Enter: Details | r: Reload | q: Quit",
                self.project_rows.len()
            )
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_detail_popup(&self, f: &mut Frame) {
        let Some(line) = self.selected_line() else {
            return;
        };
        let Some(project) = self.db.get(&line.id) else {
            return;
        };

        let label = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(vec![Span::styled("Description: ", label), Span::raw(project.description.clone())]),
            Line::from(vec![
                Span::styled("Stall period: ", label),
                Span::raw(format!("{} days", line.stall_period)),
                Span::raw(if line.stalled { "  (stalled)" } else { "" }),
            ]),
        ];
        for (flag, date, name) in [
            (project.is_completed(), &project.completion_date, "Completed"),
            (project.is_postponed(), &project.postponement_date, "Postponed"),
            (project.is_cancelled(), &project.cancellation_date, "Cancelled"),
        ] {
            if flag {
                lines.push(Line::from(format!("{}: {}", name, date.as_deref().unwrap_or("-"))));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("Tasks ({}%)", line.progress), label)));
        if project.tasks.is_empty() {
            lines.push(Line::from("  none"));
        }
        for (i, task) in project.tasks.iter().enumerate() {
            let mark = if task.completed { "[x]" } else { "[ ]" };
            let date = task
                .completed_date
                .as_deref()
                .or(task.created_date.as_deref())
                .unwrap_or("-");
            lines.push(Line::from(format!("  {} {:>2}. {} ({})", mark, i, task.description, date)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Activity", label)));
        if project.activities.is_empty() {
            lines.push(Line::from("  none"));
        }
        for activity in project.activities.iter().rev() {
            lines.push(Line::from(format!(
                "  {}  {}",
                activity.date.as_deref().unwrap_or("-"),
                activity.description
            )));
        }

        let area = centered_rect(70, 70, f.area());
        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} [{}] ", project.name, project.priority))
                    .border_style(Style::default().fg(priority_color(&project.priority))),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}

/// Text progress bar, `BAR_WIDTH` cells wide.
fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::project::Project;

    fn app_with(projects: Vec<Project>) -> (tempfile::TempDir, DashboardApp) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_file: dir.path().join("projects_data.json"),
            default_stall_period: 3,
        };
        let mut db = Database::default();
        for p in projects {
            db.create_project(p);
        }
        FileStore::new(&config.data_file).save(&db).unwrap();
        (dir, DashboardApp::new(&config))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(app: &mut DashboardApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "░".repeat(10));
        assert_eq!(progress_bar(100), "█".repeat(10));
        assert_eq!(progress_bar(55), format!("{}{}", "█".repeat(5), "░".repeat(5)));
    }

    #[test]
    fn test_rows_follow_dashboard_order() {
        let mut cancelled = Project::new("Dropped", "", Priority::High, 3);
        cancelled.mark_cancelled(Local::now().date_naive());
        let (_dir, app) = app_with(vec![
            Project::new("Later", "", Priority::Low, 3),
            cancelled,
            Project::new("Now", "", Priority::High, 3),
        ]);
        let ids: Vec<&str> = app.project_ids().collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(app.rows.len(), 6);
        assert_eq!(app.selected_id(), Some("3"));
    }

    #[test]
    fn test_navigation_is_clamped() {
        let (_dir, mut app) = app_with(vec![
            Project::new("A", "", Priority::High, 3),
            Project::new("B", "", Priority::High, 3),
        ]);
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_id(), Some("1"));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected_id(), Some("2"));
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn test_detail_popup_and_quit() {
        let mut p = Project::new("Garden", "beds", Priority::Medium, 3);
        p.add_task("Buy soil", Local::now().date_naive());
        let (_dir, mut app) = app_with(vec![p]);

        assert!(!app.handle_key(key(KeyCode::Enter)));
        assert!(app.show_detail);
        assert!(screen(&mut app).contains("Buy soil"));

        // Esc closes the popup before it quits.
        assert!(!app.handle_key(key(KeyCode::Esc)));
        assert!(!app.show_detail);
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_empty_store_renders() {
        let (_dir, mut app) = app_with(vec![]);
        assert!(!app.handle_key(key(KeyCode::Enter)));
        assert!(!app.show_detail);
        let text = screen(&mut app);
        assert!(text.contains("Active Projects (0)"));
        assert!(text.contains("No projects"));
    }

    #[test]
    fn test_reload_keeps_selection() {
        let (dir, mut app) = app_with(vec![
            Project::new("A", "", Priority::Low, 3),
            Project::new("B", "", Priority::Low, 3),
        ]);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_id(), Some("2"));

        let store = FileStore::new(dir.path().join("projects_data.json"));
        let mut db = store.load();
        db.create_project(Project::new("C", "", Priority::High, 3));
        store.save(&db).unwrap();

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.selected_id(), Some("2"));
        assert_eq!(app.project_rows.len(), 3);
    }
}
