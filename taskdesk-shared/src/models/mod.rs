/// Database models for Taskdesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, roles, and lockout bookkeeping
/// - `project`: Projects owned by users
/// - `task`: Tasks belonging to projects
///
/// Ownership flows `user → project → task`; the delete cascade follows the
/// same chain.

pub mod project;
pub mod task;
pub mod user;
