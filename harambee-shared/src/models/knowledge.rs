/// Club knowledge base
///
/// Versioned reference articles scoped to a club. Every content edit bumps
/// the version counter; there is no stored version history, the counter
/// only signals staleness to clients.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE knowledge_articles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     club_id UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     content TEXT NOT NULL,
///     version INTEGER NOT NULL DEFAULT 1,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct KnowledgeArticle {
    pub id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    pub content: String,

    /// Incremented on every edit
    pub version: i32,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeArticle {
    pub async fn create(
        pool: &PgPool,
        club_id: Uuid,
        title: &str,
        content: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let article = sqlx::query_as::<_, KnowledgeArticle>(
            r#"
            INSERT INTO knowledge_articles (club_id, title, content, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, club_id, title, content, version, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(club_id)
        .bind(title)
        .bind(content)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(article)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let article = sqlx::query_as::<_, KnowledgeArticle>(
            r#"
            SELECT id, club_id, title, content, version, created_by,
                   created_at, updated_at
            FROM knowledge_articles
            WHERE id = $1 AND club_id = $2
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(article)
    }

    pub async fn list(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let articles = sqlx::query_as::<_, KnowledgeArticle>(
            r#"
            SELECT id, club_id, title, content, version, created_by,
                   created_at, updated_at
            FROM knowledge_articles
            WHERE club_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(articles)
    }

    /// Edits an article, bumping its version
    pub async fn update(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let article = sqlx::query_as::<_, KnowledgeArticle>(
            r#"
            UPDATE knowledge_articles
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND club_id = $2
            RETURNING id, club_id, title, content, version, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .bind(title)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(article)
    }

    pub async fn delete(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM knowledge_articles WHERE id = $1 AND club_id = $2")
            .bind(id)
            .bind(club_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
