/// Task CRUD endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List tasks visible to the actor
///   (`?project_id=` narrows to one project)
/// - `POST   /v1/tasks` - Create a task under an accessible project
/// - `GET    /v1/tasks/:id` - Fetch one task
/// - `PUT    /v1/tasks/:id` - Update fields
/// - `PATCH  /v1/tasks/:id/status` - Quick status change (board
///   drag-and-drop)
/// - `DELETE /v1/tasks/:id` - Delete
///
/// A task's effective owner is its parent project's owner; every item
/// decision goes through `authorize_task_access`, which resolves that
/// chain from stored rows.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskdesk_shared::{
    auth::authorization::{self, Access, Actor},
    models::{
        project::Project,
        task::{CreateTask, Task, TaskStatus, UpdateTask},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the task listing
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Restrict the listing to one project
    pub project_id: Option<Uuid>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Parent project
    pub project_id: Uuid,

    /// Task title
    #[validate(length(min = 2, max = 255, message = "Title must be 2-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to todo)
    #[serde(default)]
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Update task request; omitted fields keep their value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be 2-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Status-only update request
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

/// Maps a task access decision to the handler result
fn require_allowed(access: Access<(Task, Project)>) -> ApiResult<(Task, Project)> {
    match access {
        Access::Allowed(found) => Ok(found),
        Access::Denied => Err(ApiError::Forbidden("Access denied".to_string())),
        Access::NotFound => Err(ApiError::NotFound("Task not found".to_string())),
    }
}

/// List tasks visible to the actor
///
/// With `?project_id=` the parent project's access decision gates the
/// whole listing; without it the scope filter runs inside the query.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    if let Some(project_id) = query.project_id {
        let access =
            authorization::authorize_project_access(&state.db, &actor, project_id).await?;

        return match access {
            Access::Allowed(project) => {
                let tasks = Task::list_for_project(&state.db, project.id).await?;
                Ok(Json(tasks))
            }
            Access::Denied => Err(ApiError::Forbidden("Access denied".to_string())),
            Access::NotFound => Err(ApiError::NotFound("Project not found".to_string())),
        };
    }

    let scope = authorization::list_scope(&actor);
    let tasks = Task::list(&state.db, scope).await?;

    Ok(Json(tasks))
}

/// Create a task under a project the actor can access
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let access =
        authorization::authorize_project_access(&state.db, &actor, req.project_id).await?;
    let project = match access {
        Access::Allowed(project) => project,
        Access::Denied => return Err(ApiError::Forbidden("Access denied".to_string())),
        Access::NotFound => return Err(ApiError::NotFound("Project not found".to_string())),
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: project.id,
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetch one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let access = authorization::authorize_task_access(&state.db, &actor, id).await?;
    let (task, _project) = require_allowed(access)?;

    Ok(Json(task))
}

/// Update a task's fields
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let access = authorization::authorize_task_access(&state.db, &actor, id).await?;
    let (task, _project) = require_allowed(access)?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Quick status change
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<Task>> {
    let access = authorization::authorize_task_access(&state.db, &actor, id).await?;
    let (task, _project) = require_allowed(access)?;

    let updated = Task::update_status(&state.db, task.id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let access = authorization::authorize_task_access(&state.db, &actor, id).await?;
    let (task, _project) = require_allowed(access)?;

    Task::delete(&state.db, task.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
