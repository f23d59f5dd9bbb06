/// API route handlers, organized by resource
///
/// - `health`: health check endpoint
/// - `auth`: registration, login (lockout-governed), token refresh,
///   first-admin bootstrap
/// - `projects`: project CRUD
/// - `tasks`: task CRUD and quick status updates
/// - `users`: admin-only user management, including unlock
/// - `stats`: role-scoped aggregate statistics
///
/// Handlers never decide permissions themselves; every check goes through
/// `taskdesk_shared::auth::{authorization, lockout}`.

pub mod auth;
pub mod health;
pub mod projects;
pub mod stats;
pub mod tasks;
pub mod users;
