/// Goals: the top of the planning hierarchy
///
/// A goal belongs to a club, is owned by a user, and fans out into
/// objectives (which carry key results) and enhanced tasks. Displayed
/// progress is derived at read time from children; the stored `progress`
/// column is only a fallback for goals with no children and a cache that
/// key-result updates refresh. See [`derive_progress`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE goal_format AS ENUM ('smart', 'okr');
/// CREATE TYPE goal_status AS ENUM ('draft', 'active', 'on-hold', 'completed', 'cancelled');
///
/// CREATE TABLE goals (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     club_id UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     format goal_format NOT NULL DEFAULT 'okr',
///     status goal_status NOT NULL DEFAULT 'draft',
///     progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
///     start_date TIMESTAMPTZ,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Goal-setting framework the goal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "goal_format", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalFormat {
    Smart,
    Okr,
}

/// Goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "goal_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    Draft,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Draft => "draft",
            GoalStatus::Active => "active",
            GoalStatus::OnHold => "on-hold",
            GoalStatus::Completed => "completed",
            GoalStatus::Cancelled => "cancelled",
        }
    }
}

/// Derives goal progress from its children at read time
///
/// Precedence: objective completion ratio if the goal has objectives, else
/// task completion ratio if it has tasks, else the stored progress. The
/// derived value is never written back here; only a key-result update
/// persists a recomputed progress.
pub fn derive_progress(
    objectives_completed: usize,
    objectives_total: usize,
    tasks_completed: usize,
    tasks_total: usize,
    stored: i32,
) -> i32 {
    if objectives_total > 0 {
        ((objectives_completed * 100) / objectives_total) as i32
    } else if tasks_total > 0 {
        ((tasks_completed * 100) / tasks_total) as i32
    } else {
        stored
    }
}

/// A goal
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub club_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub format: GoalFormat,
    pub status: GoalStatus,

    /// Stored progress; display uses [`derive_progress`] over this
    pub progress: i32,

    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGoal {
    pub club_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub format: GoalFormat,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Field changes for a goal update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGoal {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<GoalStatus>,
    pub progress: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Goal {
    /// Creates a goal in `draft` status
    pub async fn create(pool: &PgPool, data: CreateGoal) -> Result<Self, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (club_id, owner_id, title, description, format, start_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, club_id, owner_id, title, description, format, status, progress,
                      start_date, due_date, created_at, updated_at
            "#,
        )
        .bind(data.club_id)
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.format)
        .bind(data.start_date)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(goal)
    }

    /// Finds a goal by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, club_id, owner_id, title, description, format, status, progress,
                   start_date, due_date, created_at, updated_at
            FROM goals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(goal)
    }

    /// Lists a club's goals, newest first
    pub async fn list_by_club(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, club_id, owner_id, title, description, format, status, progress,
                   start_date, due_date, created_at, updated_at
            FROM goals
            WHERE club_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(goals)
    }

    /// Lists goals owned by a user
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, club_id, owner_id, title, description, format, status, progress,
                   start_date, due_date, created_at, updated_at
            FROM goals
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(goals)
    }

    /// Updates a goal's fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: UpdateGoal,
    ) -> Result<Option<Self>, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                progress = COALESCE($5, progress),
                start_date = COALESCE($6, start_date),
                due_date = COALESCE($7, due_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, club_id, owner_id, title, description, format, status, progress,
                      start_date, due_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status)
        .bind(changes.progress.map(|p| p.clamp(0, 100)))
        .bind(changes.start_date)
        .bind(changes.due_date)
        .fetch_optional(pool)
        .await?;

        Ok(goal)
    }

    /// Computes the derived progress for display
    ///
    /// One aggregate query over objectives and linked tasks, then the
    /// read-time precedence in [`derive_progress`].
    pub async fn derived_progress(&self, pool: &PgPool) -> Result<i32, sqlx::Error> {
        let (obj_completed, obj_total, task_completed, task_total): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM objectives WHERE goal_id = $1 AND status = 'completed'),
                    (SELECT COUNT(*) FROM objectives WHERE goal_id = $1),
                    (SELECT COUNT(*) FROM enhanced_tasks WHERE goal_id = $1 AND status = 'completed'),
                    (SELECT COUNT(*) FROM enhanced_tasks WHERE goal_id = $1)
                "#,
            )
            .bind(self.id)
            .fetch_one(pool)
            .await?;

        Ok(derive_progress(
            obj_completed as usize,
            obj_total as usize,
            task_completed as usize,
            task_total as usize,
            self.progress,
        ))
    }

    /// Deletes a goal and its objectives/key results (CASCADE)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objectives_take_precedence() {
        // Even with tasks present, objectives drive the derived value
        assert_eq!(derive_progress(1, 2, 9, 10, 5), 50);
    }

    #[test]
    fn test_tasks_when_no_objectives() {
        assert_eq!(derive_progress(0, 0, 3, 4, 5), 75);
    }

    #[test]
    fn test_stored_fallback_when_no_children() {
        assert_eq!(derive_progress(0, 0, 0, 0, 42), 42);
    }

    #[test]
    fn test_all_children_complete() {
        assert_eq!(derive_progress(3, 3, 0, 0, 0), 100);
        assert_eq!(derive_progress(0, 0, 4, 4, 0), 100);
    }

    #[test]
    fn test_no_children_complete() {
        assert_eq!(derive_progress(0, 3, 0, 0, 80), 0);
    }

    #[test]
    fn test_goal_status_as_str() {
        assert_eq!(GoalStatus::OnHold.as_str(), "on-hold");
        assert_eq!(GoalStatus::Draft.as_str(), "draft");
    }
}
