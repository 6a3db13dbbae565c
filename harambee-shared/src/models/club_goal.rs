/// Simple club goals
///
/// Lightweight goal entries attached directly to a club, distinct from the
/// OKR planning hierarchy in `goal`/`objective`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClubGoal {
    pub id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ClubGoal {
    pub async fn create(
        pool: &PgPool,
        club_id: Uuid,
        title: &str,
        description: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let goal = sqlx::query_as::<_, ClubGoal>(
            r#"
            INSERT INTO club_goals (club_id, title, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, club_id, title, description, created_by, created_at
            "#,
        )
        .bind(club_id)
        .bind(title)
        .bind(description)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(goal)
    }

    pub async fn list(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let goals = sqlx::query_as::<_, ClubGoal>(
            r#"
            SELECT id, club_id, title, description, created_by, created_at
            FROM club_goals
            WHERE club_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(goals)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let goal = sqlx::query_as::<_, ClubGoal>(
            r#"
            SELECT id, club_id, title, description, created_by, created_at
            FROM club_goals
            WHERE id = $1 AND club_id = $2
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(goal)
    }

    pub async fn update(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let goal = sqlx::query_as::<_, ClubGoal>(
            r#"
            UPDATE club_goals
            SET title = COALESCE($3, title),
                description = COALESCE($4, description)
            WHERE id = $1 AND club_id = $2
            RETURNING id, club_id, title, description, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .bind(title)
        .bind(description)
        .fetch_optional(pool)
        .await?;

        Ok(goal)
    }

    pub async fn delete(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM club_goals WHERE id = $1 AND club_id = $2")
            .bind(id)
            .bind(club_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
