/// Club forum: topics and replies
///
/// Flat discussion threads scoped to a club. Any member may open a topic or
/// reply; authors may edit their own posts, club admins may remove any.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A forum topic
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub club_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A reply within a topic
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopicReply {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    /// Opens a new topic
    pub async fn create(
        pool: &PgPool,
        club_id: Uuid,
        title: &str,
        content: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let topic = sqlx::query_as::<_, Topic>(
            r#"
            INSERT INTO topics (club_id, title, content, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, club_id, title, content, created_by, created_at
            "#,
        )
        .bind(club_id)
        .bind(title)
        .bind(content)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(topic)
    }

    /// Finds a topic by ID within a club
    pub async fn find_by_id(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let topic = sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, club_id, title, content, created_by, created_at
            FROM topics
            WHERE id = $1 AND club_id = $2
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(topic)
    }

    /// Lists a club's topics, newest first
    pub async fn list(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, club_id, title, content, created_by, created_at
            FROM topics
            WHERE club_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(topics)
    }

    /// Edits a topic's title and/or content
    pub async fn update(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let topic = sqlx::query_as::<_, Topic>(
            r#"
            UPDATE topics
            SET title = COALESCE($3, title),
                content = COALESCE($4, content)
            WHERE id = $1 AND club_id = $2
            RETURNING id, club_id, title, content, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .bind(title)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        Ok(topic)
    }

    /// Deletes a topic and its replies (CASCADE)
    pub async fn delete(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1 AND club_id = $2")
            .bind(id)
            .bind(club_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl TopicReply {
    /// Adds a reply to a topic
    pub async fn create(
        pool: &PgPool,
        topic_id: Uuid,
        content: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let reply = sqlx::query_as::<_, TopicReply>(
            r#"
            INSERT INTO topic_replies (topic_id, content, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, topic_id, content, created_by, created_at
            "#,
        )
        .bind(topic_id)
        .bind(content)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(reply)
    }

    /// Lists a topic's replies, oldest first
    pub async fn list(pool: &PgPool, topic_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let replies = sqlx::query_as::<_, TopicReply>(
            r#"
            SELECT id, topic_id, content, created_by, created_at
            FROM topic_replies
            WHERE topic_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(topic_id)
        .fetch_all(pool)
        .await?;

        Ok(replies)
    }

    /// Finds a reply by ID within a topic
    pub async fn find_by_id(
        pool: &PgPool,
        topic_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let reply = sqlx::query_as::<_, TopicReply>(
            r#"
            SELECT id, topic_id, content, created_by, created_at
            FROM topic_replies
            WHERE id = $1 AND topic_id = $2
            "#,
        )
        .bind(id)
        .bind(topic_id)
        .fetch_optional(pool)
        .await?;

        Ok(reply)
    }

    /// Deletes a reply
    pub async fn delete(pool: &PgPool, topic_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM topic_replies WHERE id = $1 AND topic_id = $2")
            .bind(id)
            .bind(topic_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
