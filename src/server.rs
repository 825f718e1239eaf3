//! HTTP surface.
//!
//! Every handler loads the whole document, applies at most one mutation, and writes the
//! whole document back before redirecting to the dashboard. A single async mutex is held
//! across load-mutate-save so concurrent requests in this process cannot interleave. File
//! I/O runs on the blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Form, Path, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::{Database, FileStore, Store};
use crate::error::{StoreError, TrackerError, TrackerResult};
use crate::fields::Priority;
use crate::policy::Policy;
use crate::project::{parse_task_index, Project};
use crate::views;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    write_lock: Arc<Mutex<()>>,
    policy: Policy,
    default_stall_period: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        AppState {
            store,
            write_lock: Arc::new(Mutex::new(())),
            policy: Policy::from_config(config),
            default_stall_period: config.default_stall_period,
        }
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    /// Read the document off the async runtime. Callers hold `write_lock`.
    async fn load(&self) -> TrackerResult<Database> {
        let store = Arc::clone(&self.store);
        let db = task::spawn_blocking(move || store.load())
            .await
            .map_err(StoreError::from)?;
        Ok(db)
    }

    /// Write the document off the async runtime. Callers hold `write_lock`.
    async fn save(&self, db: Database) -> TrackerResult<()> {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || store.save(&db))
            .await
            .map_err(StoreError::from)??;
        Ok(())
    }

    /// Load, apply `f` to one project, save. Fails with `NotFound` before touching anything
    /// if the project does not exist.
    async fn update_project<F>(&self, project_id: &str, f: F) -> TrackerResult<Redirect>
    where
        F: FnOnce(&mut Project, NaiveDate) -> TrackerResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await?;
        let project = db.get_mut(project_id)?;
        f(project, self.today())?;
        self.save(db).await?;
        Ok(Redirect::to("/"))
    }

    /// Name and stall period of a project, for the form pages.
    async fn project_header(&self, project_id: &str) -> TrackerResult<(String, Option<i64>)> {
        let _guard = self.write_lock.lock().await;
        let db = self.load().await?;
        let project = db.get(project_id).ok_or(TrackerError::NotFound)?;
        Ok((project.name.clone(), project.stall_period))
    }
}

/// Build the router with every route wired to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add_project", get(add_project_form).post(add_project))
        .route(
            "/edit_stall_period/{project_id}",
            get(edit_stall_period_form).post(edit_stall_period),
        )
        .route("/add_activity/{project_id}", get(add_activity_form).post(add_activity))
        .route("/add_task/{project_id}", get(add_task_form).post(add_task))
        .route("/complete_task/{project_id}/{task_index}", get(complete_task))
        .route("/delete_task/{project_id}/{task_index}", get(delete_task))
        .route("/delete_project/{project_id}", get(delete_project))
        .route("/complete_project/{project_id}", get(complete_project))
        .route("/postpone_project/{project_id}", get(postpone_project))
        .route("/cancel_project/{project_id}", get(cancel_project))
        .route("/resume_project/{project_id}", get(resume_project))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the data file if needed and serve until Ctrl-C.
pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let store = FileStore::new(&config.data_file);
    store
        .ensure_exists()
        .with_context(|| format!("creating data file {}", config.data_file.display()))?;
    info!(path = %config.data_file.display(), "using data file");

    let app = router(AppState::new(Arc::new(store), &config));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("project tracker listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

/// Accepts any integer; blank means "use the default".
fn parse_stall_period(raw: Option<&str>, default: i64) -> TrackerResult<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| TrackerError::InvalidStallPeriod(s.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct NewProjectForm {
    project_name: String,
    project_description: String,
    project_priority: String,
    #[serde(default)]
    stall_period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StallPeriodForm {
    stall_period: String,
}

#[derive(Debug, Deserialize)]
struct ActivityForm {
    activity_description: String,
}

#[derive(Debug, Deserialize)]
struct TaskForm {
    task_description: String,
}

async fn index(State(state): State<AppState>) -> TrackerResult<Html<String>> {
    let db = {
        let _guard = state.write_lock.lock().await;
        state.load().await?
    };
    let dash = state.policy.dashboard(&db, state.today());
    Ok(Html(views::dashboard_page(&dash)))
}

async fn add_project_form(State(state): State<AppState>) -> Html<String> {
    Html(views::add_project_page(state.default_stall_period))
}

async fn add_project(
    State(state): State<AppState>,
    Form(form): Form<NewProjectForm>,
) -> TrackerResult<Redirect> {
    let stall_period = parse_stall_period(form.stall_period.as_deref(), state.default_stall_period)?;
    let project = Project::new(
        form.project_name,
        form.project_description,
        Priority::from(form.project_priority),
        stall_period,
    );

    let _guard = state.write_lock.lock().await;
    let mut db = state.load().await?;
    let id = db.create_project(project);
    state.save(db).await?;
    info!(project_id = %id, "created project");
    Ok(Redirect::to("/"))
}

async fn edit_stall_period_form(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Html<String>> {
    let (name, stall_period) = state.project_header(&project_id).await?;
    let current = stall_period.unwrap_or(state.default_stall_period);
    Ok(Html(views::edit_stall_period_page(&project_id, &name, current)))
}

async fn edit_stall_period(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Form(form): Form<StallPeriodForm>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, _| {
            let raw = form.stall_period.trim();
            let days = raw
                .parse::<i64>()
                .map_err(|_| TrackerError::InvalidStallPeriod(raw.to_string()))?;
            project.set_stall_period(days);
            Ok(())
        })
        .await?;
    info!(%project_id, "updated stall period");
    Ok(redirect)
}

async fn add_activity_form(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Html<String>> {
    let (name, _) = state.project_header(&project_id).await?;
    Ok(Html(views::add_activity_page(&project_id, &name)))
}

async fn add_activity(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Form(form): Form<ActivityForm>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, today| {
            project.add_activity(form.activity_description, today);
            Ok(())
        })
        .await?;
    info!(%project_id, "logged activity");
    Ok(redirect)
}

async fn add_task_form(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Html<String>> {
    let (name, _) = state.project_header(&project_id).await?;
    Ok(Html(views::add_task_page(&project_id, &name)))
}

async fn add_task(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Form(form): Form<TaskForm>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, today| {
            project.add_task(form.task_description, today);
            Ok(())
        })
        .await?;
    info!(%project_id, "added task");
    Ok(redirect)
}

async fn complete_task(
    State(state): State<AppState>,
    Path((project_id, task_index)): Path<(String, String)>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, today| {
            project.complete_task(parse_task_index(&task_index)?, today)
        })
        .await?;
    info!(%project_id, %task_index, "completed task");
    Ok(redirect)
}

async fn delete_task(
    State(state): State<AppState>,
    Path((project_id, task_index)): Path<(String, String)>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, _| {
            project.delete_task(parse_task_index(&task_index)?).map(|_| ())
        })
        .await?;
    info!(%project_id, %task_index, "deleted task");
    Ok(redirect)
}

/// Deleting a project that is already gone is not an error.
async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Redirect> {
    let _guard = state.write_lock.lock().await;
    let mut db = state.load().await?;
    if db.delete_project(&project_id) {
        state.save(db).await?;
        info!(%project_id, "deleted project");
    }
    Ok(Redirect::to("/"))
}

async fn complete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, today| {
            project.mark_completed(today);
            Ok(())
        })
        .await?;
    info!(%project_id, "completed project");
    Ok(redirect)
}

async fn postpone_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, today| {
            project.mark_postponed(today);
            Ok(())
        })
        .await?;
    info!(%project_id, "postponed project");
    Ok(redirect)
}

async fn cancel_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, today| {
            project.mark_cancelled(today);
            Ok(())
        })
        .await?;
    info!(%project_id, "cancelled project");
    Ok(redirect)
}

async fn resume_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> TrackerResult<Redirect> {
    let redirect = state
        .update_project(&project_id, |project, _| {
            project.resume();
            Ok(())
        })
        .await?;
    info!(%project_id, "resumed project");
    Ok(redirect)
}
