/// Application state and router builder
///
/// Defines the shared application state and assembles the Axum router with
/// all routes and middleware.
///
/// # Router Layout
///
/// ```text
/// /
/// ├── /health                    # Health check (public)
/// └── /v1/                       # API v1
///     ├── /auth/                 # Public: register, login, refresh,
///     │                          #         bootstrap-admin
///     ├── /projects/             # Authenticated, ownership-scoped
///     ├── /tasks/                # Authenticated, ownership-scoped
///     ├── /stats/                # Authenticated, role-scoped aggregates
///     └── /users/                # Authenticated + admin-gated
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first): trace logging, CORS, security
/// headers; bearer-token authentication per route group, with the
/// admin gate stacked on top for `/v1/users`.

use crate::{config::Config, middleware::security::security_headers, routes};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdesk_shared::auth::middleware::{require_admin, require_auth};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each request handler via Axum's `State` extractor; the
/// config rides an Arc so the clone stays cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let secret = state.config.jwt.secret.clone();
    let auth_layer = axum::middleware::from_fn(move |req: Request, next: Next| {
        require_auth(secret.clone(), req, next)
    });

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/bootstrap-admin", post(routes::auth::bootstrap_admin));

    // Project CRUD (authenticated; per-row decisions in the handlers)
    let project_routes = Router::new()
        .route("/", get(routes::projects::list_projects))
        .route("/", post(routes::projects::create_project))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", axum::routing::put(routes::projects::update_project))
        .route("/:id", axum::routing::delete(routes::projects::delete_project))
        .layer(auth_layer.clone());

    // Task CRUD (authenticated; ownership resolved through the parent
    // project)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", axum::routing::put(routes::tasks::update_task))
        .route("/:id", axum::routing::delete(routes::tasks::delete_task))
        .route("/:id/status", patch(routes::tasks::update_task_status))
        .layer(auth_layer.clone());

    // Aggregate statistics (authenticated, role-scoped)
    let stats_routes = Router::new()
        .route("/overview", get(routes::stats::overview))
        .route("/charts", get(routes::stats::charts))
        .layer(auth_layer.clone());

    // User management (authenticated + admin only)
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/", post(routes::users::create_user))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", axum::routing::put(routes::users::update_user))
        .route("/:id", axum::routing::delete(routes::users::delete_user))
        .route("/:id/unlock", post(routes::users::unlock_user))
        .layer(axum::middleware::from_fn(require_admin))
        .layer(auth_layer);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/stats", stats_routes)
        .nest("/users", user_routes);

    // CORS: permissive in development, explicit origins in production.
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            security_headers(production, req, next)
        }))
        .with_state(state)
}
