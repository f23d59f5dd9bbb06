/// Project CRUD endpoints
///
/// # Endpoints
///
/// - `GET    /v1/projects` - List projects visible to the actor
/// - `POST   /v1/projects` - Create a project owned by the actor
/// - `GET    /v1/projects/:id` - Fetch one project
/// - `PUT    /v1/projects/:id` - Update name/description
/// - `DELETE /v1/projects/:id` - Delete (tasks cascade)
///
/// Listing is filtered by the actor's scope inside the SQL query; item
/// access goes through `authorize_project_access`, which keeps 403
/// (exists, not yours) and 404 (does not exist) distinct.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskdesk_shared::{
    auth::authorization::{self, Access, Actor},
    models::project::{CreateProject, Project, ProjectWithOwner, UpdateProject},
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 2, max = 255, message = "Name must be 2-255 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,
}

/// Update project request; omitted fields keep their value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be 2-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Maps an access decision to the handler result
fn require_allowed(access: Access<Project>) -> ApiResult<Project> {
    match access {
        Access::Allowed(project) => Ok(project),
        Access::Denied => Err(ApiError::Forbidden("Access denied".to_string())),
        Access::NotFound => Err(ApiError::NotFound("Project not found".to_string())),
    }
}

/// List projects visible to the actor
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<ProjectWithOwner>>> {
    let scope = authorization::list_scope(&actor);
    let projects = Project::list(&state.db, scope).await?;

    Ok(Json(projects))
}

/// Create a project
///
/// The owner is always the authenticated actor; a client-supplied owner
/// field would not be trusted and none is accepted.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: req.name,
            description: req.description,
            owner_id: actor.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Fetch one project
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let access = authorization::authorize_project_access(&state.db, &actor, id).await?;
    let project = require_allowed(access)?;

    Ok(Json(project))
}

/// Update a project's name/description
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let access = authorization::authorize_project_access(&state.db, &actor, id).await?;
    let project = require_allowed(access)?;

    let updated = Project::update(
        &state.db,
        project.id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a project and, through the cascade, its tasks
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let access = authorization::authorize_project_access(&state.db, &actor, id).await?;
    let project = require_allowed(access)?;

    Project::delete(&state.db, project.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
