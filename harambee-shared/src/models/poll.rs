/// Community polls
///
/// A poll belongs to a community and holds a fixed set of options. Votes
/// live in `poll_votes` whose primary key is `(poll_id, user_id)`, so one
/// user gets exactly one vote per poll no matter how many concurrent
/// requests they fire; a duplicate surfaces as a unique violation the API
/// maps to a client error.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE polls (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     community_id UUID NOT NULL REFERENCES communities(id) ON DELETE CASCADE,
///     question TEXT NOT NULL,
///     is_closed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE poll_votes (
///     poll_id UUID NOT NULL REFERENCES polls(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     option_id UUID NOT NULL REFERENCES poll_options(id) ON DELETE CASCADE,
///     voted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (poll_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A poll in a community
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub community_id: Uuid,
    pub question: String,

    /// Closed polls reject new votes but remain readable
    pub is_closed: bool,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One answer option of a poll
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub position: i32,
    pub text: String,
}

/// A recorded vote
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollVote {
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub option_id: Uuid,
    pub voted_at: DateTime<Utc>,
}

/// Per-option tally used in poll results
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OptionTally {
    pub option_id: Uuid,
    pub position: i32,
    pub text: String,
    pub votes: i64,
}

impl Poll {
    /// Creates a poll with its options in one transaction
    ///
    /// Options are stored with their submitted order as `position`.
    pub async fn create(
        pool: &PgPool,
        community_id: Uuid,
        question: &str,
        options: &[String],
        created_by: Uuid,
    ) -> Result<(Self, Vec<PollOption>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let poll = sqlx::query_as::<_, Poll>(
            r#"
            INSERT INTO polls (community_id, question, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, community_id, question, is_closed, created_by, created_at
            "#,
        )
        .bind(community_id)
        .bind(question)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(options.len());
        for (position, text) in options.iter().enumerate() {
            let option = sqlx::query_as::<_, PollOption>(
                r#"
                INSERT INTO poll_options (poll_id, position, text)
                VALUES ($1, $2, $3)
                RETURNING id, poll_id, position, text
                "#,
            )
            .bind(poll.id)
            .bind(position as i32)
            .bind(text)
            .fetch_one(&mut *tx)
            .await?;

            created.push(option);
        }

        tx.commit().await?;

        Ok((poll, created))
    }

    /// Finds a poll by ID within a community
    pub async fn find_by_id(
        pool: &PgPool,
        community_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let poll = sqlx::query_as::<_, Poll>(
            r#"
            SELECT id, community_id, question, is_closed, created_by, created_at
            FROM polls
            WHERE id = $1 AND community_id = $2
            "#,
        )
        .bind(id)
        .bind(community_id)
        .fetch_optional(pool)
        .await?;

        Ok(poll)
    }

    /// Lists a community's polls, newest first
    pub async fn list(pool: &PgPool, community_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let polls = sqlx::query_as::<_, Poll>(
            r#"
            SELECT id, community_id, question, is_closed, created_by, created_at
            FROM polls
            WHERE community_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(community_id)
        .fetch_all(pool)
        .await?;

        Ok(polls)
    }

    /// Closes a poll (idempotent)
    pub async fn close(
        pool: &PgPool,
        community_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let poll = sqlx::query_as::<_, Poll>(
            r#"
            UPDATE polls
            SET is_closed = TRUE
            WHERE id = $1 AND community_id = $2
            RETURNING id, community_id, question, is_closed, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(community_id)
        .fetch_optional(pool)
        .await?;

        Ok(poll)
    }

    /// Lists a poll's options in display order
    pub async fn options(pool: &PgPool, poll_id: Uuid) -> Result<Vec<PollOption>, sqlx::Error> {
        let options = sqlx::query_as::<_, PollOption>(
            r#"
            SELECT id, poll_id, position, text
            FROM poll_options
            WHERE poll_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(pool)
        .await?;

        Ok(options)
    }

    /// Tallies votes per option, including options with zero votes
    pub async fn tally(pool: &PgPool, poll_id: Uuid) -> Result<Vec<OptionTally>, sqlx::Error> {
        let tally = sqlx::query_as::<_, OptionTally>(
            r#"
            SELECT po.id AS option_id, po.position, po.text, COUNT(pv.user_id) AS votes
            FROM poll_options po
            LEFT JOIN poll_votes pv ON pv.option_id = po.id
            WHERE po.poll_id = $1
            GROUP BY po.id, po.position, po.text
            ORDER BY po.position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(pool)
        .await?;

        Ok(tally)
    }
}

impl PollVote {
    /// Casts a vote
    ///
    /// The option must belong to the poll (checked in the INSERT's
    /// subquery); voting twice violates the `(poll_id, user_id)` primary
    /// key. A vote against a missing or foreign option affects no rows and
    /// returns `None`.
    pub async fn cast(
        pool: &PgPool,
        poll_id: Uuid,
        option_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let vote = sqlx::query_as::<_, PollVote>(
            r#"
            INSERT INTO poll_votes (poll_id, user_id, option_id)
            SELECT $1, $2, id FROM poll_options WHERE id = $3 AND poll_id = $1
            RETURNING poll_id, user_id, option_id, voted_at
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(option_id)
        .fetch_optional(pool)
        .await?;

        Ok(vote)
    }

    /// Returns the authenticated user's vote on a poll, if any
    pub async fn find(
        pool: &PgPool,
        poll_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let vote = sqlx::query_as::<_, PollVote>(
            r#"
            SELECT poll_id, user_id, option_id, voted_at
            FROM poll_votes
            WHERE poll_id = $1 AND user_id = $2
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(vote)
    }
}
