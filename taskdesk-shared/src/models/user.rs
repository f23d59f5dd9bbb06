/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing
/// user accounts, including the lockout bookkeeping columns mutated by the
/// login flow (`failed_login_attempts`, `locked_until`).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'user');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     failed_login_attempts INTEGER NOT NULL DEFAULT 0,
///     locked_until TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a user cascades to their projects and, through those, to their
/// tasks (`ON DELETE CASCADE` on both foreign keys).
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::User,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "ada@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account role, checked only through the authorization policy entry points
///
/// A closed enumeration rather than free-form strings: handlers never
/// compare role names, they ask the policy functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access to every project, task, and user account
    Admin,

    /// Access limited to resources the account owns
    User,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. The hash is
/// excluded from serialization so the row can be returned from handlers
/// without leaking it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role
    pub role: UserRole,

    /// Consecutive failed login attempts since the last successful login
    /// or admin unlock
    pub failed_login_attempts: i32,

    /// End of the current lockout window, if any
    ///
    /// A value in the past means the account is no longer locked; expiry
    /// alone does not reset `failed_login_attempts`.
    pub locked_until: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address (must be unique)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Account role
    pub role: UserRole,
}

/// Input for updating an existing user
///
/// All fields are optional; only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New role
    pub role: Option<UserRole>,
}

/// Post-increment lockout state returned by [`User::record_failed_attempt`]
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LockState {
    /// Failure count after the increment
    pub failed_login_attempts: i32,

    /// Lock expiry after the increment (set iff the threshold was reached
    /// by this or an earlier attempt)
    pub locked_until: Option<DateTime<Utc>>,
}

/// Admin listing row: account plus per-user activity counts, computed in
/// one query
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserOverview {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    /// Number of projects owned by this user
    pub project_count: i64,

    /// Number of tasks across this user's projects
    pub task_count: i64,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role,
                      failed_login_attempts, locked_until, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role,
                   failed_login_attempts, locked_until, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role,
                   failed_login_attempts, locked_until, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the new email already belongs to another user or
    /// the database is unreachable.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role)
            WHERE id = $1
            RETURNING id, name, email, password_hash, role,
                      failed_login_attempts, locked_until, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// The user's projects, and the tasks under them, are removed by the
    /// cascade chain in the same statement.
    ///
    /// # Returns
    ///
    /// True if a user was deleted, false if none existed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records one failed login attempt and locks the account when the
    /// post-increment count reaches `threshold`
    ///
    /// The increment and the conditional lock happen in a single
    /// `UPDATE … RETURNING` statement so two concurrent failed attempts
    /// cannot both observe the pre-increment count; the "lock after exactly
    /// N failures" invariant holds under concurrent load.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Failure count at which the account locks
    /// * `lock_until` - Lock expiry to set when the threshold is reached
    ///
    /// # Returns
    ///
    /// The post-increment [`LockState`], or None if the user no longer
    /// exists.
    pub async fn record_failed_attempt(
        pool: &PgPool,
        id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
    ) -> Result<Option<LockState>, sqlx::Error> {
        let state = sqlx::query_as::<_, LockState>(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1,
                locked_until = CASE
                    WHEN failed_login_attempts + 1 >= $2 THEN $3
                    ELSE locked_until
                END
            WHERE id = $1
            RETURNING failed_login_attempts, locked_until
            "#,
        )
        .bind(id)
        .bind(threshold)
        .bind(lock_until)
        .fetch_optional(pool)
        .await?;

        Ok(state)
    }

    /// Resets `failed_login_attempts` to 0 and clears `locked_until`
    ///
    /// Idempotent; called on every successful login and by the admin
    /// unlock action.
    ///
    /// # Returns
    ///
    /// True if the user exists, false otherwise
    pub async fn clear_failed_attempts(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = 0, locked_until = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users with their project/task counts, newest first
    ///
    /// Backs the admin user listing.
    pub async fn list_with_activity(pool: &PgPool) -> Result<Vec<UserOverview>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserOverview>(
            r#"
            SELECT u.id, u.name, u.email, u.role,
                   u.failed_login_attempts, u.locked_until, u.created_at,
                   (SELECT COUNT(*) FROM projects p WHERE p.owner_id = u.id) AS project_count,
                   (SELECT COUNT(*)
                    FROM tasks t
                    JOIN projects p ON p.id = t.project_id
                    WHERE p.owner_id = u.id) AS task_count
            FROM users u
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts accounts with the admin role
    ///
    /// Used by the bootstrap-admin endpoint, which only works while this
    /// is zero.
    pub async fn count_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::User.as_str(), "user");
    }

    #[test]
    fn test_user_role_serde_roundtrip() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let role: UserRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, UserRole::User);
    }

    #[test]
    fn test_user_serialization_skips_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::User,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("test@example.com"));
    }

    #[test]
    fn test_update_user_default_is_noop() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.role.is_none());
    }

    // Database-backed behavior (atomic increments, cascade deletes) is
    // covered in tests/lockout_db_tests.rs against a live PostgreSQL.
}
