/// Authorization policy: ownership-scoped access decisions
///
/// Every permission decision in Taskdesk goes through this module. The
/// rule is deliberately small: admins may touch everything, other users
/// only what they own. A task's effective owner is always its parent
/// project's owner — task rows never carry access rights of their own, and
/// a client-supplied owner field is never trusted.
///
/// The decision functions are pure; the `authorize_*` functions combine
/// them with the row fetch and distinguish absence from denial. Callers
/// map [`Access::Denied`] to 403 and [`Access::NotFound`] to 404, decided
/// solely by whether the row exists, independent of ownership.
///
/// # Example
///
/// ```no_run
/// use sqlx::PgPool;
/// use uuid::Uuid;
/// use taskdesk_shared::auth::authorization::{authorize_project_access, Access, Actor};
/// use taskdesk_shared::models::user::UserRole;
///
/// # async fn example(pool: PgPool, project_id: Uuid) -> Result<(), sqlx::Error> {
/// let actor = Actor { id: Uuid::new_v4(), role: UserRole::User };
///
/// match authorize_project_access(&pool, &actor, project_id).await? {
///     Access::Allowed(project) => println!("ok: {}", project.name),
///     Access::Denied => println!("forbidden"),
///     Access::NotFound => println!("no such project"),
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{project::Project, task::Task, user::UserRole};

/// The identity a decision is made for
///
/// Session identity is an explicit value passed into each decision call,
/// never ambient state. Built from verified token claims by the auth
/// middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Authenticated user ID
    pub id: Uuid,

    /// Role carried in the verified token
    pub role: UserRole,
}

impl Actor {
    /// Creates an actor value
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    /// True iff this actor holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Row filter for list queries
///
/// Callers apply this scope inside the SQL query instead of post-filtering
/// result sets, so other users' rows are neither fetched nor observable
/// through timing or id probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// No filter; every row is visible
    All,

    /// Only rows owned by this user
    OwnedOnly(Uuid),
}

/// Outcome of a storage-backed access check
///
/// `NotFound` strictly means the row does not exist; a row that exists but
/// belongs to someone else is `Denied`, with no further detail.
#[derive(Debug, Clone)]
pub enum Access<T> {
    /// Access granted; carries the fetched resource so callers don't fetch
    /// it twice
    Allowed(T),

    /// The resource exists but the actor may not touch it
    Denied,

    /// The resource does not exist
    NotFound,
}

/// Decides whether `actor` may read or modify `project`
///
/// True iff the actor is an admin or owns the project.
pub fn can_access_project(actor: &Actor, project: &Project) -> bool {
    actor.is_admin() || project.owner_id == actor.id
}

/// Decides whether `actor` may read or modify `task`
///
/// Delegates to [`can_access_project`] on the task's parent; the task's
/// own fields play no part in the decision.
pub fn can_access_task(actor: &Actor, _task: &Task, project: &Project) -> bool {
    can_access_project(actor, project)
}

/// Scope for the actor's list queries: everything for admins, own rows
/// otherwise
pub fn list_scope(actor: &Actor) -> ListScope {
    if actor.is_admin() {
        ListScope::All
    } else {
        ListScope::OwnedOnly(actor.id)
    }
}

/// Decides whether `actor` may set `target_user_id`'s role to `new_role`
///
/// An admin may not demote themselves; whether the actor is an admin at
/// all is gated separately at the surface layer.
pub fn can_change_role(actor: &Actor, target_user_id: Uuid, new_role: UserRole) -> bool {
    !(target_user_id == actor.id && new_role != UserRole::Admin)
}

/// Decides whether `actor` may delete the account `target_user_id`
///
/// Self-deletion is always refused.
pub fn can_delete_user(actor: &Actor, target_user_id: Uuid) -> bool {
    target_user_id != actor.id
}

/// Fetches a project and checks access in one step
pub async fn authorize_project_access(
    pool: &PgPool,
    actor: &Actor,
    project_id: Uuid,
) -> Result<Access<Project>, sqlx::Error> {
    match Project::find_by_id(pool, project_id).await? {
        None => Ok(Access::NotFound),
        Some(project) if can_access_project(actor, &project) => Ok(Access::Allowed(project)),
        Some(_) => Ok(Access::Denied),
    }
}

/// Fetches a task, resolves its parent project, and checks access
///
/// The ownership chain is resolved here, through the stored
/// `task.project_id`, never through anything the client supplied.
pub async fn authorize_task_access(
    pool: &PgPool,
    actor: &Actor,
    task_id: Uuid,
) -> Result<Access<(Task, Project)>, sqlx::Error> {
    let Some(task) = Task::find_by_id(pool, task_id).await? else {
        return Ok(Access::NotFound);
    };

    // The foreign key makes a missing parent unreachable in practice, but
    // a dangling row still must not authorize anything.
    let Some(project) = Project::find_by_id(pool, task.project_id).await? else {
        return Ok(Access::NotFound);
    };

    if can_access_task(actor, &task, &project) {
        Ok(Access::Allowed((task, project)))
    } else {
        Ok(Access::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::task::TaskStatus;

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), UserRole::Admin)
    }

    fn user() -> Actor {
        Actor::new(Uuid::new_v4(), UserRole::User)
    }

    fn project_owned_by(owner_id: Uuid) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Website".to_string(),
            description: None,
            owner_id,
            created_at: Utc::now(),
        }
    }

    fn task_in(project: &Project) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: project.id,
            title: "Ship it".to_string(),
            description: None,
            status: TaskStatus::Todo,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_accesses_any_project() {
        let actor = admin();

        for _ in 0..5 {
            let project = project_owned_by(Uuid::new_v4());
            assert!(can_access_project(&actor, &project));
        }
    }

    #[test]
    fn test_user_accesses_only_own_projects() {
        let actor = user();

        let own = project_owned_by(actor.id);
        let other = project_owned_by(Uuid::new_v4());

        assert!(can_access_project(&actor, &own));
        assert!(!can_access_project(&actor, &other));
    }

    #[test]
    fn test_task_access_mirrors_parent_project() {
        let owner = user();
        let stranger = user();

        let project = project_owned_by(owner.id);
        let task = task_in(&project);

        assert!(can_access_task(&owner, &task, &project));
        assert!(!can_access_task(&stranger, &task, &project));
        assert!(can_access_task(&admin(), &task, &project));
    }

    #[test]
    fn test_list_scope_by_role() {
        let a = admin();
        let u = user();

        assert_eq!(list_scope(&a), ListScope::All);
        assert_eq!(list_scope(&u), ListScope::OwnedOnly(u.id));
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        let actor = admin();

        assert!(!can_change_role(&actor, actor.id, UserRole::User));
        // Re-asserting their own admin role is a no-op, not a demotion.
        assert!(can_change_role(&actor, actor.id, UserRole::Admin));
        // Other accounts can move either way.
        let other = Uuid::new_v4();
        assert!(can_change_role(&actor, other, UserRole::User));
        assert!(can_change_role(&actor, other, UserRole::Admin));
    }

    #[test]
    fn test_self_deletion_always_refused() {
        let actor = admin();

        assert!(!can_delete_user(&actor, actor.id));
        assert!(can_delete_user(&actor, Uuid::new_v4()));
    }

    #[test]
    fn test_cross_tenant_scenario() {
        // User A (owner) creates P1; user B is denied, admin is allowed.
        let user_a = user();
        let user_b = user();
        let root = admin();

        let p1 = project_owned_by(user_a.id);

        assert!(can_access_project(&user_a, &p1));
        assert!(!can_access_project(&user_b, &p1));
        assert!(can_access_project(&root, &p1));
    }
}
