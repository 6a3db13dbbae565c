/// Enhanced tasks: the richer task model used by the planning subsystem
///
/// Adds goal/objective/parent linkage, typed dependencies, checklists,
/// comments, and time entries on top of the plain task fields. The same
/// progress-status coupling applies here with this model's status set, and
/// checklist toggles feed back into task progress monotonically: the
/// recomputed checklist percentage raises stored progress but never lowers
/// it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskPriority;

/// Enhanced task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enhanced_task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EnhancedTaskStatus {
    Todo,
    InProgress,
    Review,
    Completed,
    Cancelled,
    Blocked,
}

impl EnhancedTaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnhancedTaskStatus::Todo => "todo",
            EnhancedTaskStatus::InProgress => "in-progress",
            EnhancedTaskStatus::Review => "review",
            EnhancedTaskStatus::Completed => "completed",
            EnhancedTaskStatus::Cancelled => "cancelled",
            EnhancedTaskStatus::Blocked => "blocked",
        }
    }
}

/// Scheduling relation between two tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dependency_kind", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

/// Reconciles status with progress for enhanced tasks
///
/// Same contract as the plain task coupling, with `todo` as the resting
/// state: `progress == 100` forces `completed`, `progress > 0` advances
/// `todo` to `in-progress`, and an explicitly `completed` task keeps its
/// progress untouched.
pub fn reconcile_status(status: EnhancedTaskStatus, progress: i32) -> EnhancedTaskStatus {
    if progress >= 100 {
        EnhancedTaskStatus::Completed
    } else if progress > 0 && status == EnhancedTaskStatus::Todo {
        EnhancedTaskStatus::InProgress
    } else {
        status
    }
}

/// Percentage of completed checklist items, rounded down
///
/// Returns 0 for an empty checklist.
pub fn checklist_progress(completed: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }

    ((completed * 100) / total) as i32
}

/// Raises stored progress to the checklist percentage if higher
///
/// Checklist-driven progress is monotonic-up: unticking items lowers the
/// checklist percentage but never auto-lowers task progress.
pub fn raise_progress(stored: i32, checklist: i32) -> i32 {
    stored.max(checklist)
}

/// An enhanced task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnhancedTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: EnhancedTaskStatus,
    pub priority: TaskPriority,
    pub progress: i32,

    /// Optional linkage into the planning hierarchy
    pub goal_id: Option<Uuid>,
    pub objective_id: Option<Uuid>,

    /// Parent task for subtasks
    pub parent_id: Option<Uuid>,

    pub club_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A checklist item on an enhanced task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub position: i32,
    pub title: String,
    pub completed: bool,
}

/// A comment on an enhanced task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A logged block of time against an enhanced task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub minutes: i32,
    pub description: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// A typed dependency edge between two enhanced tasks
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskDependency {
    pub task_id: Uuid,
    pub depends_on_id: Uuid,
    pub kind: DependencyKind,
}

/// Input for creating an enhanced task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEnhancedTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub goal_id: Option<Uuid>,
    pub objective_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub club_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

/// Field changes for an enhanced task update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEnhancedTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<EnhancedTaskStatus>,
    pub priority: Option<TaskPriority>,
    pub progress: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

const RETURNING: &str = r#"
    RETURNING id, title, description, status, priority, progress, goal_id,
              objective_id, parent_id, club_id, due_date, completed_at,
              created_by, created_at, updated_at
"#;

impl EnhancedTask {
    /// Creates an enhanced task
    pub async fn create(pool: &PgPool, data: CreateEnhancedTask) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO enhanced_tasks
                (title, description, priority, goal_id, objective_id, parent_id,
                 club_id, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            {RETURNING}
            "#
        );

        let task = sqlx::query_as::<_, EnhancedTask>(&sql)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.goal_id)
            .bind(data.objective_id)
            .bind(data.parent_id)
            .bind(data.club_id)
            .bind(data.due_date)
            .bind(data.created_by)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds an enhanced task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, EnhancedTask>(
            r#"
            SELECT id, title, description, status, priority, progress, goal_id,
                   objective_id, parent_id, club_id, due_date, completed_at,
                   created_by, created_at, updated_at
            FROM enhanced_tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks created by a user, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, EnhancedTask>(
            r#"
            SELECT id, title, description, status, priority, progress, goal_id,
                   objective_id, parent_id, club_id, due_date, completed_at,
                   created_by, created_at, updated_at
            FROM enhanced_tasks
            WHERE created_by = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks linked to an objective
    pub async fn list_by_objective(
        pool: &PgPool,
        objective_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, EnhancedTask>(
            r#"
            SELECT id, title, description, status, priority, progress, goal_id,
                   objective_id, parent_id, club_id, due_date, completed_at,
                   created_by, created_at, updated_at
            FROM enhanced_tasks
            WHERE objective_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(objective_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks linked to a goal
    pub async fn list_by_goal(pool: &PgPool, goal_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, EnhancedTask>(
            r#"
            SELECT id, title, description, status, priority, progress, goal_id,
                   objective_id, parent_id, club_id, due_date, completed_at,
                   created_by, created_at, updated_at
            FROM enhanced_tasks
            WHERE goal_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(goal_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies an update with the progress-status coupling
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: UpdateEnhancedTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let progress = changes.progress.unwrap_or(current.progress).clamp(0, 100);
        let requested = changes.status.unwrap_or(current.status);
        let status = reconcile_status(requested, progress);

        Self::write_update(pool, id, &changes, status, progress).await
    }

    /// Toggles a checklist item and propagates progress
    ///
    /// Runs in one transaction: flip the item, recompute the checklist
    /// percentage, raise task progress if the percentage exceeds it, then
    /// reconcile status. Returns the updated task and the new checklist
    /// percentage, or `None` if the item does not belong to the task.
    pub async fn toggle_checklist_item(
        pool: &PgPool,
        task_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<(Self, i32)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let toggled = sqlx::query(
            r#"
            UPDATE checklist_items
            SET completed = NOT completed
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(item_id)
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

        if toggled.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let (completed, total): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE completed), COUNT(*)
            FROM checklist_items
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_one(&mut *tx)
        .await?;

        let checklist = checklist_progress(completed as usize, total as usize);

        let sql = format!(
            r#"
            UPDATE enhanced_tasks
            SET progress = GREATEST(progress, $2),
                status = CASE
                    WHEN GREATEST(progress, $2) >= 100 THEN 'completed'::enhanced_task_status
                    WHEN GREATEST(progress, $2) > 0 AND status = 'todo' THEN 'in-progress'::enhanced_task_status
                    ELSE status
                END,
                completed_at = CASE
                    WHEN GREATEST(progress, $2) >= 100 THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE id = $1
            {RETURNING}
            "#
        );

        let task = sqlx::query_as::<_, EnhancedTask>(&sql)
            .bind(task_id)
            .bind(checklist)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(task.map(|t| (t, checklist)))
    }

    /// Deletes an enhanced task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM enhanced_tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn write_update(
        pool: &PgPool,
        id: Uuid,
        changes: &UpdateEnhancedTask,
        status: EnhancedTaskStatus,
        progress: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE enhanced_tasks
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
            {RETURNING}
            "#
        );

        let task = sqlx::query_as::<_, EnhancedTask>(&sql)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(status)
            .bind(changes.priority)
            .bind(progress)
            .bind(changes.due_date)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }
}

impl ChecklistItem {
    /// Appends a checklist item at the next position
    pub async fn add(pool: &PgPool, task_id: Uuid, title: &str) -> Result<Self, sqlx::Error> {
        let item = sqlx::query_as::<_, ChecklistItem>(
            r#"
            INSERT INTO checklist_items (task_id, position, title)
            SELECT $1, COALESCE(MAX(position) + 1, 0), $2
            FROM checklist_items
            WHERE task_id = $1
            RETURNING id, task_id, position, title, completed
            "#,
        )
        .bind(task_id)
        .bind(title)
        .fetch_one(pool)
        .await?;

        Ok(item)
    }

    /// Lists a task's checklist in order
    pub async fn list(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, ChecklistItem>(
            r#"
            SELECT id, task_id, position, title, completed
            FROM checklist_items
            WHERE task_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Removes a checklist item
    pub async fn remove(pool: &PgPool, task_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM checklist_items WHERE id = $1 AND task_id = $2")
            .bind(id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl TaskComment {
    /// Adds a comment
    pub async fn add(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, TaskComment>(
            r#"
            INSERT INTO task_comments (task_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, user_id, content, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Lists a task's comments, oldest first
    pub async fn list(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, TaskComment>(
            r#"
            SELECT id, task_id, user_id, content, created_at
            FROM task_comments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }
}

impl TimeEntry {
    /// Logs time against a task
    pub async fn log(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        minutes: i32,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            INSERT INTO time_entries (task_id, user_id, minutes, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, minutes, description, logged_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(minutes)
        .bind(description)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Lists a task's time entries, newest first
    pub async fn list(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, TimeEntry>(
            r#"
            SELECT id, task_id, user_id, minutes, description, logged_at
            FROM time_entries
            WHERE task_id = $1
            ORDER BY logged_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Total minutes logged against a task
    pub async fn total_minutes(pool: &PgPool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(minutes), 0) FROM time_entries WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_one(pool)
        .await?;

        Ok(total)
    }
}

impl TaskDependency {
    /// Adds a dependency edge
    ///
    /// Self-dependencies are rejected by the CHECK constraint; duplicates
    /// by the primary key.
    pub async fn add(
        pool: &PgPool,
        task_id: Uuid,
        depends_on_id: Uuid,
        kind: DependencyKind,
    ) -> Result<Self, sqlx::Error> {
        let dependency = sqlx::query_as::<_, TaskDependency>(
            r#"
            INSERT INTO task_dependencies (task_id, depends_on_id, kind)
            VALUES ($1, $2, $3)
            RETURNING task_id, depends_on_id, kind
            "#,
        )
        .bind(task_id)
        .bind(depends_on_id)
        .bind(kind)
        .fetch_one(pool)
        .await?;

        Ok(dependency)
    }

    /// Lists the tasks a task depends on
    pub async fn list(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let dependencies = sqlx::query_as::<_, TaskDependency>(
            r#"
            SELECT task_id, depends_on_id, kind
            FROM task_dependencies
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(dependencies)
    }

    /// Removes a dependency edge
    pub async fn remove(
        pool: &PgPool,
        task_id: Uuid,
        depends_on_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM task_dependencies WHERE task_id = $1 AND depends_on_id = $2",
        )
        .bind(task_id)
        .bind(depends_on_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_progress_forces_completed() {
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Todo, 100),
            EnhancedTaskStatus::Completed
        );
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Review, 100),
            EnhancedTaskStatus::Completed
        );
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Blocked, 100),
            EnhancedTaskStatus::Completed
        );
    }

    #[test]
    fn test_partial_progress_advances_todo_only() {
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Todo, 30),
            EnhancedTaskStatus::InProgress
        );
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Review, 30),
            EnhancedTaskStatus::Review
        );
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Blocked, 30),
            EnhancedTaskStatus::Blocked
        );
    }

    #[test]
    fn test_completed_keeps_partial_progress() {
        assert_eq!(
            reconcile_status(EnhancedTaskStatus::Completed, 40),
            EnhancedTaskStatus::Completed
        );
    }

    #[test]
    fn test_checklist_progress_ratios() {
        assert_eq!(checklist_progress(0, 0), 0);
        assert_eq!(checklist_progress(0, 4), 0);
        assert_eq!(checklist_progress(2, 4), 50);
        assert_eq!(checklist_progress(3, 4), 75);
        assert_eq!(checklist_progress(4, 4), 100);
        assert_eq!(checklist_progress(1, 3), 33);
    }

    #[test]
    fn test_checklist_raise_is_monotonic() {
        // Raises when checklist percentage is higher
        assert_eq!(raise_progress(50, 75), 75);

        // Never lowers when items are unticked
        assert_eq!(raise_progress(75, 50), 75);
        assert_eq!(raise_progress(100, 0), 100);
    }

    #[test]
    fn test_status_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EnhancedTaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::to_string(&DependencyKind::FinishToStart).unwrap(),
            "\"finish-to-start\""
        );
    }
}
