/// Project model and database operations
///
/// A project is owned by exactly one user (`owner_id`); ownership is the
/// unit the authorization policy reasons about. Tasks hang off projects and
/// inherit their owner transitively.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::ListScope;

/// Project model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Owning user; authorization decisions key off this field
    pub owner_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Listing row: project plus the owner's display name
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectWithOwner {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,

    /// Display name of the owning user
    pub owner_name: String,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user (the authenticated actor, never client-supplied)
    pub owner_id: Uuid,
}

/// Input for updating a project; None keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Project {
    /// Creates a new project
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Updates a project; only non-None fields are written
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project; its tasks go with it via the cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists projects visible under `scope`, newest first
    ///
    /// The scope filter is applied in SQL rather than by post-filtering the
    /// result set, so rows outside the caller's scope are never fetched.
    pub async fn list(
        pool: &PgPool,
        scope: ListScope,
    ) -> Result<Vec<ProjectWithOwner>, sqlx::Error> {
        let projects = match scope {
            ListScope::All => {
                sqlx::query_as::<_, ProjectWithOwner>(
                    r#"
                    SELECT p.id, p.name, p.description, p.owner_id, p.created_at,
                           u.name AS owner_name
                    FROM projects p
                    JOIN users u ON u.id = p.owner_id
                    ORDER BY p.created_at DESC
                    "#,
                )
                .fetch_all(pool)
                .await?
            }
            ListScope::OwnedOnly(owner_id) => {
                sqlx::query_as::<_, ProjectWithOwner>(
                    r#"
                    SELECT p.id, p.name, p.description, p.owner_id, p.created_at,
                           u.name AS owner_name
                    FROM projects p
                    JOIN users u ON u.id = p.owner_id
                    WHERE p.owner_id = $1
                    ORDER BY p.created_at DESC
                    "#,
                )
                .bind(owner_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(projects)
    }

    /// Lists a single user's projects, newest first
    ///
    /// Backs the admin user-detail view.
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, created_at
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_project_default_is_noop() {
        let update = UpdateProject::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
    }

    #[test]
    fn test_project_serializes_owner() {
        let project = Project {
            id: Uuid::new_v4(),
            name: "Website".to_string(),
            description: None,
            owner_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["name"], "Website");
        assert!(json["owner_id"].is_string());
    }
}
