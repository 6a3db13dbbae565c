/// Objectives and key results
///
/// An objective belongs to a goal and carries measurable key results. The
/// objective's progress is the average of key-result completion ratios;
/// unlike goal progress (derived at read time), a key-result update is the
/// one path that persists the recomputed value back to the objective row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE objective_status AS ENUM ('not_started', 'in_progress', 'completed');
/// CREATE TYPE key_result_status AS ENUM ('not-started', 'in-progress', 'completed', 'at-risk');
///
/// CREATE TABLE key_results (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     objective_id UUID NOT NULL REFERENCES objectives(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     target_value DOUBLE PRECISION NOT NULL,
///     current_value DOUBLE PRECISION NOT NULL DEFAULT 0,
///     unit VARCHAR(50) NOT NULL DEFAULT '',
///     status key_result_status NOT NULL DEFAULT 'not-started',
///     due_date TIMESTAMPTZ,
///     owner_id UUID REFERENCES users(id) ON DELETE SET NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Objective lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "objective_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Key result tracking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "key_result_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum KeyResultStatus {
    NotStarted,
    InProgress,
    Completed,
    AtRisk,
}

/// Completion ratio of a single key result, in `[0.0, 1.0]`
///
/// A `completed` status counts as fully done regardless of values; with a
/// non-positive target the ratio is 0 unless completed. Overshooting the
/// target caps at 1.
pub fn completion_ratio(current: f64, target: f64, status: KeyResultStatus) -> f64 {
    if status == KeyResultStatus::Completed {
        return 1.0;
    }

    if target <= 0.0 {
        return 0.0;
    }

    (current / target).clamp(0.0, 1.0)
}

/// Objective progress as the average key-result completion, 0 to 100
///
/// Returns 0 for an objective with no key results.
pub fn average_progress(ratios: &[f64]) -> i32 {
    if ratios.is_empty() {
        return 0;
    }

    let sum: f64 = ratios.iter().sum();
    ((sum / ratios.len() as f64) * 100.0).round() as i32
}

/// Status implied by a progress value
pub fn status_for_progress(progress: i32) -> ObjectiveStatus {
    if progress >= 100 {
        ObjectiveStatus::Completed
    } else if progress > 0 {
        ObjectiveStatus::InProgress
    } else {
        ObjectiveStatus::NotStarted
    }
}

/// An objective under a goal
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Objective {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub title: String,
    pub success_criteria: String,
    pub status: ObjectiveStatus,

    /// Persisted by key-result updates; derived for display otherwise
    pub progress: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A measurable key result
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KeyResult {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub title: String,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub status: KeyResultStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
}

impl Objective {
    /// Creates an objective under a goal
    pub async fn create(
        pool: &PgPool,
        goal_id: Uuid,
        title: &str,
        success_criteria: &str,
    ) -> Result<Self, sqlx::Error> {
        let objective = sqlx::query_as::<_, Objective>(
            r#"
            INSERT INTO objectives (goal_id, title, success_criteria)
            VALUES ($1, $2, $3)
            RETURNING id, goal_id, title, success_criteria, status, progress,
                      created_at, updated_at
            "#,
        )
        .bind(goal_id)
        .bind(title)
        .bind(success_criteria)
        .fetch_one(pool)
        .await?;

        Ok(objective)
    }

    /// Finds an objective by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let objective = sqlx::query_as::<_, Objective>(
            r#"
            SELECT id, goal_id, title, success_criteria, status, progress,
                   created_at, updated_at
            FROM objectives
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(objective)
    }

    /// Lists a goal's objectives in creation order
    pub async fn list_by_goal(pool: &PgPool, goal_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let objectives = sqlx::query_as::<_, Objective>(
            r#"
            SELECT id, goal_id, title, success_criteria, status, progress,
                   created_at, updated_at
            FROM objectives
            WHERE goal_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(goal_id)
        .fetch_all(pool)
        .await?;

        Ok(objectives)
    }

    /// Updates title, criteria, and/or status
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        title: Option<&str>,
        success_criteria: Option<&str>,
        status: Option<ObjectiveStatus>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let objective = sqlx::query_as::<_, Objective>(
            r#"
            UPDATE objectives
            SET title = COALESCE($2, title),
                success_criteria = COALESCE($3, success_criteria),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, goal_id, title, success_criteria, status, progress,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(success_criteria)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(objective)
    }

    /// Computes the derived progress for display without persisting
    pub async fn derived_progress(&self, pool: &PgPool) -> Result<i32, sqlx::Error> {
        let key_results = KeyResult::list_by_objective(pool, self.id).await?;

        if key_results.is_empty() {
            return Ok(self.progress);
        }

        let ratios: Vec<f64> = key_results
            .iter()
            .map(|kr| completion_ratio(kr.current_value, kr.target_value, kr.status))
            .collect();

        Ok(average_progress(&ratios))
    }

    /// Deletes an objective and its key results (CASCADE)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM objectives WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Recomputes and persists progress from key results
    ///
    /// The only write path for objective progress. Runs inside the caller's
    /// transaction so the key-result change and the recompute land
    /// together.
    async fn persist_progress(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        objective_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let key_results = sqlx::query_as::<_, KeyResult>(
            r#"
            SELECT id, objective_id, title, target_value, current_value, unit,
                   status, due_date, owner_id
            FROM key_results
            WHERE objective_id = $1
            "#,
        )
        .bind(objective_id)
        .fetch_all(&mut **tx)
        .await?;

        let ratios: Vec<f64> = key_results
            .iter()
            .map(|kr| completion_ratio(kr.current_value, kr.target_value, kr.status))
            .collect();

        let progress = average_progress(&ratios);
        let status = status_for_progress(progress);

        sqlx::query(
            r#"
            UPDATE objectives
            SET progress = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(objective_id)
        .bind(progress)
        .bind(status)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

impl KeyResult {
    /// Adds a key result and recomputes the objective's progress
    pub async fn create(
        pool: &PgPool,
        objective_id: Uuid,
        title: &str,
        target_value: f64,
        unit: &str,
        due_date: Option<DateTime<Utc>>,
        owner_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let key_result = sqlx::query_as::<_, KeyResult>(
            r#"
            INSERT INTO key_results (objective_id, title, target_value, unit, due_date, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, objective_id, title, target_value, current_value, unit,
                      status, due_date, owner_id
            "#,
        )
        .bind(objective_id)
        .bind(title)
        .bind(target_value)
        .bind(unit)
        .bind(due_date)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        Objective::persist_progress(&mut tx, objective_id).await?;

        tx.commit().await?;

        Ok(key_result)
    }

    /// Lists an objective's key results
    pub async fn list_by_objective(
        pool: &PgPool,
        objective_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let key_results = sqlx::query_as::<_, KeyResult>(
            r#"
            SELECT id, objective_id, title, target_value, current_value, unit,
                   status, due_date, owner_id
            FROM key_results
            WHERE objective_id = $1
            "#,
        )
        .bind(objective_id)
        .fetch_all(pool)
        .await?;

        Ok(key_results)
    }

    /// Updates a key result's value/status and persists objective progress
    ///
    /// Key-result change and objective recompute run in one transaction.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        current_value: Option<f64>,
        status: Option<KeyResultStatus>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let key_result = sqlx::query_as::<_, KeyResult>(
            r#"
            UPDATE key_results
            SET current_value = COALESCE($2, current_value),
                status = COALESCE($3, status)
            WHERE id = $1
            RETURNING id, objective_id, title, target_value, current_value, unit,
                      status, due_date, owner_id
            "#,
        )
        .bind(id)
        .bind(current_value)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(key_result) = key_result else {
            tx.rollback().await?;
            return Ok(None);
        };

        Objective::persist_progress(&mut tx, key_result.objective_id).await?;

        tx.commit().await?;

        Ok(Some(key_result))
    }

    /// Removes a key result and recomputes the objective's progress
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let objective_id: Option<(Uuid,)> = sqlx::query_as(
            "DELETE FROM key_results WHERE id = $1 RETURNING objective_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((objective_id,)) = objective_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        Objective::persist_progress(&mut tx, objective_id).await?;

        tx.commit().await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_ratio() {
        assert_eq!(completion_ratio(5.0, 10.0, KeyResultStatus::InProgress), 0.5);
        assert_eq!(completion_ratio(0.0, 10.0, KeyResultStatus::NotStarted), 0.0);
        assert_eq!(completion_ratio(10.0, 10.0, KeyResultStatus::InProgress), 1.0);
    }

    #[test]
    fn test_completion_ratio_caps_overshoot() {
        assert_eq!(completion_ratio(15.0, 10.0, KeyResultStatus::InProgress), 1.0);
    }

    #[test]
    fn test_completed_status_overrides_values() {
        assert_eq!(completion_ratio(0.0, 10.0, KeyResultStatus::Completed), 1.0);
        assert_eq!(completion_ratio(0.0, 0.0, KeyResultStatus::Completed), 1.0);
    }

    #[test]
    fn test_zero_target_not_completed() {
        assert_eq!(completion_ratio(5.0, 0.0, KeyResultStatus::InProgress), 0.0);
    }

    #[test]
    fn test_average_progress() {
        assert_eq!(average_progress(&[]), 0);
        assert_eq!(average_progress(&[0.5, 1.0]), 75);
        assert_eq!(average_progress(&[0.0, 0.0, 1.0]), 33);
        assert_eq!(average_progress(&[1.0, 1.0]), 100);
    }

    #[test]
    fn test_status_for_progress() {
        assert_eq!(status_for_progress(0), ObjectiveStatus::NotStarted);
        assert_eq!(status_for_progress(1), ObjectiveStatus::InProgress);
        assert_eq!(status_for_progress(99), ObjectiveStatus::InProgress);
        assert_eq!(status_for_progress(100), ObjectiveStatus::Completed);
    }

    #[test]
    fn test_objective_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ObjectiveStatus::NotStarted).unwrap(),
            "\"not_started\""
        );
        assert_eq!(
            serde_json::to_string(&KeyResultStatus::AtRisk).unwrap(),
            "\"at-risk\""
        );
    }
}
