/// Aggregate statistics endpoints
///
/// # Endpoints
///
/// - `GET /v1/stats/overview` - Totals and breakdowns for the dashboard
/// - `GET /v1/stats/charts` - Label/value series for the chart widgets
///
/// Both endpoints are role-scoped through `list_scope`: admins aggregate
/// over everything (and additionally see account totals), regular users
/// only over their own projects and tasks. The scope is applied inside
/// the SQL, never by filtering fetched rows.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use taskdesk_shared::auth::authorization::{self, Actor, ListScope};
use taskdesk_shared::models::task::TaskStatus;
use uuid::Uuid;

/// Account totals, admin overview only
#[derive(Debug, Serialize)]
pub struct UserTotals {
    pub total: i64,
    pub admins: i64,
    pub regular: i64,

    /// Accounts whose lockout window is currently open
    pub locked: i64,
}

/// Project totals by derived state
///
/// A project is `in_progress` while any of its tasks is unfinished,
/// `completed` when it has tasks and all are done, `no_tasks` otherwise.
#[derive(Debug, Default, Serialize)]
pub struct ProjectTotals {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub no_tasks: i64,
}

/// Task totals by status
#[derive(Debug, Default, Serialize)]
pub struct TaskTotals {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
}

/// Tasks created on one day
#[derive(Debug, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: i64,
}

/// Overview response
#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    /// Present for admins only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<UserTotals>,

    pub projects: ProjectTotals,
    pub tasks: TaskTotals,

    /// Tasks created per day over the last 30 days, newest first
    pub recent_activity: Vec<DailyActivity>,
}

/// One label/value pair of a chart series
#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: i64,
}

/// Created/completed tallies for one month
#[derive(Debug, Serialize)]
pub struct MonthlyProgress {
    /// `YYYY-MM`
    pub month: String,
    pub tasks_created: i64,
    pub tasks_completed: i64,
}

/// Charts response
#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub projects_status: Vec<ChartPoint>,
    pub tasks_status: Vec<ChartPoint>,

    /// Top task-producing users; admin scope only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_activity: Option<Vec<ChartPoint>>,

    /// Tasks per project; user scope only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_activity: Option<Vec<ChartPoint>>,

    /// Created vs. completed tasks over the last 12 months
    pub monthly_progress: Vec<MonthlyProgress>,
}

async fn project_totals(pool: &PgPool, owner: Option<Uuid>) -> Result<ProjectTotals, sqlx::Error> {
    let rows: Vec<(String, i64)> = match owner {
        None => {
            sqlx::query_as(
                r#"
                SELECT CASE
                    WHEN EXISTS (SELECT 1 FROM tasks t
                                 WHERE t.project_id = p.id AND t.status <> 'done')
                        THEN 'in_progress'
                    WHEN EXISTS (SELECT 1 FROM tasks t WHERE t.project_id = p.id)
                        THEN 'completed'
                    ELSE 'no_tasks'
                END AS state, COUNT(*)
                FROM projects p
                GROUP BY state
                "#,
            )
            .fetch_all(pool)
            .await?
        }
        Some(owner_id) => {
            sqlx::query_as(
                r#"
                SELECT CASE
                    WHEN EXISTS (SELECT 1 FROM tasks t
                                 WHERE t.project_id = p.id AND t.status <> 'done')
                        THEN 'in_progress'
                    WHEN EXISTS (SELECT 1 FROM tasks t WHERE t.project_id = p.id)
                        THEN 'completed'
                    ELSE 'no_tasks'
                END AS state, COUNT(*)
                FROM projects p
                WHERE p.owner_id = $1
                GROUP BY state
                "#,
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
    };

    let mut totals = ProjectTotals::default();
    for (state, count) in rows {
        totals.total += count;
        match state.as_str() {
            "completed" => totals.completed = count,
            "in_progress" => totals.in_progress = count,
            _ => totals.no_tasks = count,
        }
    }

    Ok(totals)
}

async fn task_totals(pool: &PgPool, owner: Option<Uuid>) -> Result<TaskTotals, sqlx::Error> {
    let rows: Vec<(TaskStatus, i64)> = match owner {
        None => {
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(pool)
                .await?
        }
        Some(owner_id) => {
            sqlx::query_as(
                r#"
                SELECT t.status, COUNT(*)
                FROM tasks t
                JOIN projects p ON p.id = t.project_id
                WHERE p.owner_id = $1
                GROUP BY t.status
                "#,
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
    };

    let mut totals = TaskTotals::default();
    for (status, count) in rows {
        totals.total += count;
        match status {
            TaskStatus::Todo => totals.todo = count,
            TaskStatus::InProgress => totals.in_progress = count,
            TaskStatus::Done => totals.done = count,
        }
    }

    Ok(totals)
}

async fn recent_activity(
    pool: &PgPool,
    owner: Option<Uuid>,
) -> Result<Vec<DailyActivity>, sqlx::Error> {
    let rows: Vec<(NaiveDate, i64)> = match owner {
        None => {
            sqlx::query_as(
                r#"
                SELECT created_at::date AS day, COUNT(*)
                FROM tasks
                WHERE created_at >= NOW() - INTERVAL '30 days'
                GROUP BY day
                ORDER BY day DESC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
        Some(owner_id) => {
            sqlx::query_as(
                r#"
                SELECT t.created_at::date AS day, COUNT(*)
                FROM tasks t
                JOIN projects p ON p.id = t.project_id
                WHERE p.owner_id = $1
                  AND t.created_at >= NOW() - INTERVAL '30 days'
                GROUP BY day
                ORDER BY day DESC
                "#,
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|(date, count)| DailyActivity { date, count })
        .collect())
}

async fn monthly_progress(
    pool: &PgPool,
    owner: Option<Uuid>,
) -> Result<Vec<MonthlyProgress>, sqlx::Error> {
    let rows: Vec<(String, i64, i64)> = match owner {
        None => {
            sqlx::query_as(
                r#"
                SELECT to_char(created_at, 'YYYY-MM') AS month,
                       COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'done')
                FROM tasks
                WHERE created_at >= NOW() - INTERVAL '12 months'
                GROUP BY month
                ORDER BY month
                "#,
            )
            .fetch_all(pool)
            .await?
        }
        Some(owner_id) => {
            sqlx::query_as(
                r#"
                SELECT to_char(t.created_at, 'YYYY-MM') AS month,
                       COUNT(*),
                       COUNT(*) FILTER (WHERE t.status = 'done')
                FROM tasks t
                JOIN projects p ON p.id = t.project_id
                WHERE p.owner_id = $1
                  AND t.created_at >= NOW() - INTERVAL '12 months'
                GROUP BY month
                ORDER BY month
                "#,
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|(month, tasks_created, tasks_completed)| MonthlyProgress {
            month,
            tasks_created,
            tasks_completed,
        })
        .collect())
}

/// Dashboard overview
pub async fn overview(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<OverviewResponse>> {
    let owner = match authorization::list_scope(&actor) {
        ListScope::All => None,
        ListScope::OwnedOnly(id) => Some(id),
    };

    let users = if owner.is_none() {
        let (total, admins, locked): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE role = 'admin'),
                   COUNT(*) FILTER (WHERE locked_until > NOW())
            FROM users
            "#,
        )
        .fetch_one(&state.db)
        .await?;

        Some(UserTotals {
            total,
            admins,
            regular: total - admins,
            locked,
        })
    } else {
        None
    };

    let projects = project_totals(&state.db, owner).await?;
    let tasks = task_totals(&state.db, owner).await?;
    let recent = recent_activity(&state.db, owner).await?;

    Ok(Json(OverviewResponse {
        users,
        projects,
        tasks,
        recent_activity: recent,
    }))
}

/// Chart series
pub async fn charts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<ChartsResponse>> {
    let owner = match authorization::list_scope(&actor) {
        ListScope::All => None,
        ListScope::OwnedOnly(id) => Some(id),
    };

    let projects = project_totals(&state.db, owner).await?;
    let projects_status = vec![
        ChartPoint { label: "completed".to_string(), value: projects.completed },
        ChartPoint { label: "in_progress".to_string(), value: projects.in_progress },
        ChartPoint { label: "no_tasks".to_string(), value: projects.no_tasks },
    ];

    let tasks = task_totals(&state.db, owner).await?;
    let tasks_status = vec![
        ChartPoint { label: TaskStatus::Todo.as_str().to_string(), value: tasks.todo },
        ChartPoint {
            label: TaskStatus::InProgress.as_str().to_string(),
            value: tasks.in_progress,
        },
        ChartPoint { label: TaskStatus::Done.as_str().to_string(), value: tasks.done },
    ];

    let user_activity = if owner.is_none() {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT u.name, COUNT(t.id)
            FROM users u
            LEFT JOIN projects p ON p.owner_id = u.id
            LEFT JOIN tasks t ON t.project_id = p.id
            GROUP BY u.id, u.name
            HAVING COUNT(t.id) > 0
            ORDER BY COUNT(t.id) DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&state.db)
        .await?;

        Some(
            rows.into_iter()
                .map(|(label, value)| ChartPoint { label, value })
                .collect(),
        )
    } else {
        None
    };

    let project_activity = if let Some(owner_id) = owner {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT p.name, COUNT(t.id)
            FROM projects p
            LEFT JOIN tasks t ON t.project_id = p.id
            WHERE p.owner_id = $1
            GROUP BY p.id, p.name
            ORDER BY COUNT(t.id) DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&state.db)
        .await?;

        Some(
            rows.into_iter()
                .map(|(label, value)| ChartPoint { label, value })
                .collect(),
        )
    } else {
        None
    };

    let monthly = monthly_progress(&state.db, owner).await?;

    Ok(Json(ChartsResponse {
        projects_status,
        tasks_status,
        user_activity,
        project_activity,
        monthly_progress: monthly,
    }))
}
