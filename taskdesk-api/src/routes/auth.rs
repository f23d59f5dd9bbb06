/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user account
/// - `POST /v1/auth/login` - Login (governed by the lockout policy)
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access
///   token
/// - `POST /v1/auth/bootstrap-admin` - Create the first admin account
///
/// The login handler is a thin shim: the whole decision lives in
/// `taskdesk_shared::auth::lockout::authenticate`, and this module only
/// maps its outcome onto HTTP.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        lockout::{self, AuthResult},
        password,
    },
    models::user::{CreateUser, User, UserRole},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Public profile returned by the auth endpoints
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Token pair plus profile returned on register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// The authenticated user
    pub user: UserProfile,
}

fn issue_tokens(user: &User, secret: &str) -> ApiResult<AuthResponse> {
    let access = Claims::new(
        user.id,
        user.name.clone(),
        user.email.clone(),
        user.role,
        TokenType::Access,
    );
    let refresh = Claims::new(
        user.id,
        user.name.clone(),
        user.email.clone(),
        user.role,
        TokenType::Refresh,
    );

    Ok(AuthResponse {
        access_token: jwt::create_token(&access, secret)?,
        refresh_token: jwt::create_token(&refresh, secret)?,
        user: UserProfile::from(user),
    })
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation or password strength failed
/// - `409 Conflict`: email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![crate::error::ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    // Self-registration always yields a regular user; roles are granted
    // through the admin surface.
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: UserRole::User,
        },
    )
    .await?;

    let response = issue_tokens(&user, state.jwt_secret())?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login
///
/// Runs the lockout-governed authentication flow and maps its outcome:
///
/// - `401 Unauthorized`: wrong password or unknown email; the message
///   carries the attempts left before lockout when a counter exists
/// - `423 Locked`: account locked, with the remaining minutes
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    match lockout::authenticate(&state.db, &req.email, &req.password, Utc::now()).await? {
        AuthResult::Success(user) => {
            let response = issue_tokens(&user, state.jwt_secret())?;
            Ok(Json(response))
        }
        AuthResult::InvalidCredentials { attempts_remaining: Some(left) } => {
            Err(ApiError::Unauthorized(format!(
                "Invalid email or password. {} attempt(s) remaining before lockout.",
                left
            )))
        }
        AuthResult::InvalidCredentials { attempts_remaining: None } => {
            Err(ApiError::Unauthorized("Invalid email or password".to_string()))
        }
        AuthResult::AccountLocked { minutes_remaining } => {
            Err(ApiError::AccountLocked { minutes_remaining })
        }
    }
}

/// Token refresh
///
/// # Errors
///
/// - `401 Unauthorized`: invalid, expired, or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Create the first admin account
///
/// Only works while no admin exists; afterwards the endpoint is
/// permanently closed and admin accounts are created through the admin
/// user-management surface.
///
/// # Errors
///
/// - `409 Conflict`: an admin already exists, or the email is taken
pub async fn bootstrap_admin(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![crate::error::ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    if User::count_admins(&state.db).await? > 0 {
        return Err(ApiError::Conflict("An admin account already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: UserRole::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "bootstrap admin account created");

    let response = issue_tokens(&user, state.jwt_secret())?;
    Ok((StatusCode::CREATED, Json(response)))
}
