/// User management endpoints (admin only)
///
/// # Endpoints
///
/// - `GET    /v1/users` - List accounts with activity counts and lock
///   state
/// - `POST   /v1/users` - Create an account (any role)
/// - `GET    /v1/users/:id` - Account detail with projects, tasks, and
///   status tallies
/// - `PUT    /v1/users/:id` - Update profile, role, or password
/// - `DELETE /v1/users/:id` - Delete account (projects/tasks cascade)
/// - `POST   /v1/users/:id/unlock` - Reset the lockout state
///
/// The whole group sits behind the admin gate in the router; the policy
/// decisions that remain here are the self-referential ones (an admin may
/// neither demote nor delete themselves).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::{authorization::{self, Actor}, lockout, password},
    models::{
        project::Project,
        task::{Task, TaskStatus},
        user::{CreateUser, UpdateUser, User, UserOverview, UserRole},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role to assign (defaults to user)
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

/// Update user request; omitted fields keep their value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Listing row enriched with the live lock state
#[derive(Debug, Serialize)]
pub struct UserListEntry {
    #[serde(flatten)]
    pub user: UserOverview,

    /// Whether the lockout window is currently open
    pub is_locked: bool,
}

/// Per-status task tallies for the detail view
#[derive(Debug, Serialize)]
pub struct UserTaskStats {
    pub project_count: usize,
    pub task_count: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub pending_tasks: usize,
}

/// Account detail response
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub stats: UserTaskStats,
}

/// List all accounts with activity counts
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserListEntry>>> {
    let now = Utc::now();
    let users = User::list_with_activity(&state.db).await?;

    let entries = users
        .into_iter()
        .map(|user| {
            let is_locked = lockout::is_locked(user.locked_until, now);
            UserListEntry { user, is_locked }
        })
        .collect();

    Ok(Json(entries))
}

/// Create an account
///
/// Unlike self-registration this may assign any role, which is why it
/// lives behind the admin gate.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Account detail with projects, tasks, and status tallies
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserDetailResponse>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let projects = Project::list_by_owner(&state.db, user.id).await?;
    let tasks = Task::list(&state.db, authorization::ListScope::OwnedOnly(user.id)).await?;

    let stats = UserTaskStats {
        project_count: projects.len(),
        task_count: tasks.len(),
        completed_tasks: tasks.iter().filter(|t| t.status == TaskStatus::Done).count(),
        in_progress_tasks: tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count(),
        pending_tasks: tasks.iter().filter(|t| t.status == TaskStatus::Todo).count(),
    };

    let now = Utc::now();

    Ok(Json(UserDetailResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        failed_login_attempts: user.failed_login_attempts,
        locked_until: user.locked_until,
        is_locked: lockout::is_locked(user.locked_until, now),
        created_at: user.created_at,
        projects,
        tasks,
        stats,
    }))
}

/// Update an account
///
/// # Errors
///
/// - `403 Forbidden`: the actor tried to demote themselves
/// - `404 Not Found`: no such account
/// - `409 Conflict`: the new email is already taken
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    if let Some(new_role) = req.role {
        if !authorization::can_change_role(&actor, id, new_role) {
            return Err(ApiError::Forbidden(
                "You cannot change your own role".to_string(),
            ));
        }
    }

    let password_hash = match req.password {
        Some(ref password) => {
            password::validate_password_strength(password).map_err(|e| {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: "password".to_string(),
                    message: e,
                }])
            })?;
            Some(password::hash_password(password)?)
        }
        None => None,
    };

    let updated = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete an account; its projects and tasks cascade away with it
///
/// # Errors
///
/// - `403 Forbidden`: the actor tried to delete themselves
/// - `404 Not Found`: no such account
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !authorization::can_delete_user(&actor, id) {
        return Err(ApiError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Reset an account's lockout state
///
/// Shares its storage operation with the successful-login reset;
/// idempotent, so unlocking an unlocked account simply succeeds.
pub async fn unlock_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let found = lockout::unlock_account(&state.db, id).await?;
    if !found {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "account unlocked by admin");

    Ok(Json(serde_json::json!({ "message": "User unlocked" })))
}
