use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::Query;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::dto::{ListQuery, TaskForm};
use super::listing::TaskListing;
use super::queries;
use crate::error::{AppError, AppResult};
use crate::forms::FormErrors;
use crate::pages::{self, TaskFormKind};
use crate::routes::middleware_auth::SessionUser;
use crate::state::AppState;

pub const LIST_PATH: &str = "/my-tasks/";

// Ids come in as text so that a malformed id is a 404 like any other
// unknown task, rather than a 400 from the path extractor.
fn task_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

pub async fn list(
    State(state): State<AppState>,
    user: SessionUser,
    // axum-extra's `Query` accepts repeated keys.
    Query(query): Query<ListQuery>,
) -> AppResult<Html<String>> {
    let tasks = queries::list_tasks(&state.db, user.id).await?;
    let listing = TaskListing::build(tasks, query.search_term(), Utc::now());

    Ok(pages::task_list(&user, &listing))
}

pub async fn create_form(_user: SessionUser) -> Html<String> {
    pages::task_form(TaskFormKind::Create, &TaskForm::default(), &FormErrors::new())
}

pub async fn create(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let fields = match form.validate_create(Utc::now()) {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(pages::task_form(TaskFormKind::Create, &form, &errors).into_response())
        }
    };

    let task = queries::create_task(&state.db, user.id, &fields).await?;
    info!(user_id = %user.id, task_id = %task.id, "task created");

    Ok(Redirect::to(LIST_PATH).into_response())
}

pub async fn edit_form(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = task_id(&id)?;
    let task = queries::find_task(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(pages::task_form(
        TaskFormKind::Update(task.id),
        &TaskForm::from_task(&task),
        &FormErrors::new(),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let id = task_id(&id)?;

    // Ownership first: a stranger gets 404 even for an invalid submission.
    queries::find_task(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let fields = match form.validate_update(Utc::now()) {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(pages::task_form(TaskFormKind::Update(id), &form, &errors).into_response())
        }
    };

    queries::update_task(&state.db, user.id, id, &fields)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %user.id, task_id = %id, "task updated");

    Ok(Redirect::to(LIST_PATH).into_response())
}

pub async fn toggle(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let id = task_id(&id)?;
    let task = queries::toggle_task(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = %user.id, task_id = %id, completed = task.is_completed, "task toggled");

    Ok(Redirect::to(LIST_PATH))
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = task_id(&id)?;
    let task = queries::find_task(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(pages::task_confirm_delete(&task))
}

pub async fn delete(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let id = task_id(&id)?;
    if !queries::delete_task(&state.db, user.id, id).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = %user.id, task_id = %id, "task deleted");

    Ok(Redirect::to(LIST_PATH))
}
