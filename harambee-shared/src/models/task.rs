/// Top-level tasks (personal and club-scoped)
///
/// A task is either `personal` or `club`; the database CHECK constraint
/// keeps `club_id` set exactly when the kind is `club`. Progress and status
/// are coupled: every write path funnels through [`reconcile_status`] so the
/// two fields cannot disagree no matter which endpoint performed the update.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_kind AS ENUM ('personal', 'club');
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed', 'archived');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     kind task_kind NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
///     due_date TIMESTAMPTZ,
///     club_id UUID REFERENCES clubs(id) ON DELETE CASCADE,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK ((kind = 'club') = (club_id IS NOT NULL))
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Whether a task is personal or belongs to a club
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Personal,
    Club,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Archived => "archived",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Reconciles status with progress after a merge of requested changes
///
/// The coupling contract, applied on every write path:
///
/// - `progress == 100` forces `Completed`
/// - `progress > 0` advances `Pending` to `InProgress`
/// - `Completed` does NOT force progress back to 100; a task completed by
///   an explicit status change keeps whatever progress it had
pub fn reconcile_status(status: TaskStatus, progress: i32) -> TaskStatus {
    if progress >= 100 {
        TaskStatus::Completed
    } else if progress > 0 && status == TaskStatus::Pending {
        TaskStatus::InProgress
    } else {
        status
    }
}

/// A work item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Completion percentage, 0 to 100
    pub progress: i32,

    pub due_date: Option<DateTime<Utc>>,

    /// Set exactly when `kind` is `club` (CHECK constraint)
    pub club_id: Option<Uuid>,

    pub created_by: Uuid,

    /// Stamped the first time the task reaches `completed`
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub club_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Field changes for a task update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub progress: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a task
    ///
    /// The caller is responsible for pairing `kind` and `club_id`; the
    /// CHECK constraint rejects a mismatch.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (kind, title, description, priority, due_date, club_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, kind, title, description, status, priority, progress, due_date,
                      club_id, created_by, completed_at, created_at, updated_at
            "#,
        )
        .bind(data.kind)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.club_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, kind, title, description, status, priority, progress, due_date,
                   club_id, created_by, completed_at, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks visible to a user: their own plus ones assigned to them
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT DISTINCT t.id, t.kind, t.title, t.description, t.status, t.priority,
                   t.progress, t.due_date, t.club_id, t.created_by, t.completed_at,
                   t.created_at, t.updated_at
            FROM tasks t
            LEFT JOIN task_assignees ta ON ta.task_id = t.id
            WHERE t.created_by = $1 OR ta.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists a club's tasks, newest first
    pub async fn list_by_club(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, kind, title, description, status, priority, progress, due_date,
                   club_id, created_by, completed_at, created_at, updated_at
            FROM tasks
            WHERE club_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies an update with the progress-status coupling
    ///
    /// Requested changes are merged over the current row, then
    /// [`reconcile_status`] decides the final status. `completed_at` is
    /// stamped on the first transition into `completed` and cleared if the
    /// task later leaves it.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let progress = changes.progress.unwrap_or(current.progress).clamp(0, 100);
        let requested = changes.status.unwrap_or(current.status);
        let status = reconcile_status(requested, progress);

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = $4,
                priority = COALESCE($5, priority),
                progress = $6,
                due_date = COALESCE($7, due_date),
                completed_at = CASE
                    WHEN $4 = 'completed' THEN COALESCE(completed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, kind, title, description, status, priority, progress, due_date,
                      club_id, created_by, completed_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(status)
        .bind(changes.priority)
        .bind(progress)
        .bind(changes.due_date)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Replaces the assignee set
    pub async fn set_assignees(
        pool: &PgPool,
        id: Uuid,
        assignees: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for user_id in assignees {
            sqlx::query(
                r#"
                INSERT INTO task_assignees (task_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Lists a task's assignees
    pub async fn assignees(pool: &PgPool, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM task_assignees WHERE task_id = $1")
                .bind(id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks in a status (admin dashboard)
    pub async fn count_by_status(pool: &PgPool, status: TaskStatus) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_progress_forces_completed() {
        assert_eq!(
            reconcile_status(TaskStatus::Pending, 100),
            TaskStatus::Completed
        );
        assert_eq!(
            reconcile_status(TaskStatus::InProgress, 100),
            TaskStatus::Completed
        );
        assert_eq!(
            reconcile_status(TaskStatus::Archived, 100),
            TaskStatus::Completed
        );
    }

    #[test]
    fn test_partial_progress_advances_pending() {
        assert_eq!(
            reconcile_status(TaskStatus::Pending, 1),
            TaskStatus::InProgress
        );
        assert_eq!(
            reconcile_status(TaskStatus::Pending, 99),
            TaskStatus::InProgress
        );
    }

    #[test]
    fn test_partial_progress_leaves_other_statuses() {
        assert_eq!(
            reconcile_status(TaskStatus::InProgress, 50),
            TaskStatus::InProgress
        );
        assert_eq!(
            reconcile_status(TaskStatus::Archived, 50),
            TaskStatus::Archived
        );
    }

    // The coupling is one-directional: completing a task by status change
    // does not force progress to 100.
    #[test]
    fn test_completed_does_not_force_progress() {
        assert_eq!(
            reconcile_status(TaskStatus::Completed, 40),
            TaskStatus::Completed
        );
    }

    #[test]
    fn test_zero_progress_keeps_pending() {
        assert_eq!(
            reconcile_status(TaskStatus::Pending, 0),
            TaskStatus::Pending
        );
    }

    #[test]
    fn test_status_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let status: TaskStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, TaskStatus::Archived);
    }
}
