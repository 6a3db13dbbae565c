/// Append-only activity log
///
/// Every planning mutation records who did what to which entity, with the
/// changed fields as old/new pairs. Rows are never updated or deleted;
/// `day`/`week`/`month` bucket strings are derived from the timestamp at
/// write time so aggregation queries group on plain text columns.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// One changed field in a recorded mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: JsonValue,
    pub new: JsonValue,
}

/// A recorded activity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,

    /// Action triple: what area, what happened, to what
    pub category: String,
    pub verb: String,
    pub object: String,

    /// Entity the action targeted
    pub entity_type: String,
    pub entity_id: Uuid,

    /// Optional context links
    pub club_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub objective_id: Option<Uuid>,
    pub task_id: Option<Uuid>,

    /// Array of [`FieldChange`] objects
    pub changes: JsonValue,

    pub created_at: DateTime<Utc>,

    /// Aggregation buckets derived from `created_at`
    pub day: String,
    pub week: String,
    pub month: String,
}

/// Context links for a new entry; all optional
#[derive(Debug, Clone, Default)]
pub struct ActivityContext {
    pub club_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub objective_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Day bucket, `YYYY-MM-DD`
pub fn day_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// ISO week bucket, `YYYY-Wnn`
///
/// Uses the ISO week-numbering year, which can differ from the calendar
/// year around January 1st.
pub fn week_bucket(at: DateTime<Utc>) -> String {
    let iso = at.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Month bucket, `YYYY-MM`
pub fn month_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

impl ActivityLog {
    /// Records an activity
    ///
    /// Bucket columns are derived from the current time; the row is
    /// immutable once written.
    pub async fn record(
        pool: &PgPool,
        actor_id: Option<Uuid>,
        category: &str,
        verb: &str,
        object: &str,
        entity_type: &str,
        entity_id: Uuid,
        context: ActivityContext,
        changes: &[FieldChange],
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let changes_json = serde_json::to_value(changes).unwrap_or(JsonValue::Array(vec![]));

        let entry = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_log
                (actor_id, category, verb, object, entity_type, entity_id,
                 club_id, goal_id, objective_id, task_id, changes, day, week, month)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, actor_id, category, verb, object, entity_type, entity_id,
                      club_id, goal_id, objective_id, task_id, changes, created_at,
                      day, week, month
            "#,
        )
        .bind(actor_id)
        .bind(category)
        .bind(verb)
        .bind(object)
        .bind(entity_type)
        .bind(entity_id)
        .bind(context.club_id)
        .bind(context.goal_id)
        .bind(context.objective_id)
        .bind(context.task_id)
        .bind(changes_json)
        .bind(day_bucket(now))
        .bind(week_bucket(now))
        .bind(month_bucket(now))
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Lists activity for a goal, newest first
    pub async fn list_by_goal(
        pool: &PgPool,
        goal_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, actor_id, category, verb, object, entity_type, entity_id,
                   club_id, goal_id, objective_id, task_id, changes, created_at,
                   day, week, month
            FROM activity_log
            WHERE goal_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(goal_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Lists activity by an actor, newest first
    pub async fn list_by_actor(
        pool: &PgPool,
        actor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, actor_id, category, verb, object, entity_type, entity_id,
                   club_id, goal_id, objective_id, task_id, changes, created_at,
                   day, week, month
            FROM activity_log
            WHERE actor_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(actor_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Lists activity for one entity, newest first
    pub async fn list_by_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, actor_id, category, verb, object, entity_type, entity_id,
                   club_id, goal_id, objective_id, task_id, changes, created_at,
                   day, week, month
            FROM activity_log
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bucket() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 14, 30, 0).unwrap();
        assert_eq!(day_bucket(at), "2025-03-07");
    }

    #[test]
    fn test_month_bucket() {
        let at = Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap();
        assert_eq!(month_bucket(at), "2025-11");
    }

    #[test]
    fn test_week_bucket() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 0, 0, 0).unwrap();
        assert_eq!(week_bucket(at), "2025-W10");
    }

    // December 29th 2014 falls in ISO week 1 of 2015.
    #[test]
    fn test_week_bucket_iso_year_boundary() {
        let at = Utc.with_ymd_and_hms(2014, 12, 29, 12, 0, 0).unwrap();
        assert_eq!(week_bucket(at), "2015-W01");
    }

    #[test]
    fn test_field_change_serializes_old_and_new() {
        let change = FieldChange {
            field: "status".into(),
            old: serde_json::json!("draft"),
            new: serde_json::json!("active"),
        };

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["field"], "status");
        assert_eq!(json["old"], "draft");
        assert_eq!(json["new"], "active");
    }
}
