/// Communities: sub-groups nested inside a club
///
/// A community carries its own roster, chat, ad-hoc tasks, and polls. Like
/// clubs, communities start `pending` and need approval (by a club admin or
/// owner) before members can see or join them; archiving freezes all
/// participation writes while keeping history readable.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE community_role AS ENUM ('member', 'admin');
/// CREATE TYPE community_task_status AS ENUM ('pending', 'in-progress', 'completed');
///
/// CREATE TABLE communities (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     club_id UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status club_status NOT NULL DEFAULT 'pending',
///     is_archived BOOLEAN NOT NULL DEFAULT FALSE,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::club::ClubStatus;

/// Role within a community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "community_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommunityRole {
    Member,
    Admin,
}

/// Status of an ad-hoc community task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "community_task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CommunityTaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl CommunityTaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunityTaskStatus::Pending => "pending",
            CommunityTaskStatus::InProgress => "in-progress",
            CommunityTaskStatus::Completed => "completed",
        }
    }
}

/// A community inside a club
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Community {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
    pub description: String,

    /// Approval status; reuses the club state machine
    pub status: ClubStatus,

    /// Archived communities reject task/chat/poll writes
    pub is_archived: bool,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A community roster entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityMember {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role: CommunityRole,
    pub joined_at: DateTime<Utc>,
}

/// An ad-hoc task tracked inside a community
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityTask {
    pub id: Uuid,
    pub community_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: CommunityTaskStatus,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A chat message in a community
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Community {
    /// Proposes a new community in `pending` status
    ///
    /// The proposer is seeded onto the roster as a community admin so the
    /// community has a manager the moment it is approved.
    pub async fn create(
        pool: &PgPool,
        club_id: Uuid,
        name: &str,
        description: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let community = sqlx::query_as::<_, Community>(
            r#"
            INSERT INTO communities (club_id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, club_id, name, description, status, is_archived,
                      created_by, created_at
            "#,
        )
        .bind(club_id)
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO community_members (community_id, user_id, role)
            VALUES ($1, $2, 'admin')
            "#,
        )
        .bind(community.id)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(community)
    }

    /// Finds a community by ID within a club
    pub async fn find_by_id(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            SELECT id, club_id, name, description, status, is_archived,
                   created_by, created_at
            FROM communities
            WHERE id = $1 AND club_id = $2
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(community)
    }

    /// Lists a club's approved communities
    pub async fn list_approved(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let communities = sqlx::query_as::<_, Community>(
            r#"
            SELECT id, club_id, name, description, status, is_archived,
                   created_by, created_at
            FROM communities
            WHERE club_id = $1 AND status = 'approved'
            ORDER BY created_at ASC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(communities)
    }

    /// Lists all of a club's communities regardless of status (managers)
    pub async fn list_all(pool: &PgPool, club_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let communities = sqlx::query_as::<_, Community>(
            r#"
            SELECT id, club_id, name, description, status, is_archived,
                   created_by, created_at
            FROM communities
            WHERE club_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(communities)
    }

    /// Approves a pending community (conditional, single decision)
    pub async fn approve(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            UPDATE communities
            SET status = 'approved'
            WHERE id = $1 AND club_id = $2 AND status = 'pending'
            RETURNING id, club_id, name, description, status, is_archived,
                      created_by, created_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(community)
    }

    /// Rejects a pending community (conditional, terminal)
    pub async fn reject(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            UPDATE communities
            SET status = 'rejected'
            WHERE id = $1 AND club_id = $2 AND status = 'pending'
            RETURNING id, club_id, name, description, status, is_archived,
                      created_by, created_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(community)
    }

    /// Sets the archived flag
    pub async fn set_archived(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
        archived: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let community = sqlx::query_as::<_, Community>(
            r#"
            UPDATE communities
            SET is_archived = $3
            WHERE id = $1 AND club_id = $2
            RETURNING id, club_id, name, description, status, is_archived,
                      created_by, created_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .bind(archived)
        .fetch_optional(pool)
        .await?;

        Ok(community)
    }

    /// Deletes a community and its contents (CASCADE)
    pub async fn delete(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM communities WHERE id = $1 AND club_id = $2")
            .bind(id)
            .bind(club_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CommunityMember {
    /// Resolves a user's role within a community, if they are a member
    pub async fn get_role(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityRole>, sqlx::Error> {
        let role: Option<(CommunityRole,)> = sqlx::query_as(
            "SELECT role FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role.map(|(r,)| r))
    }

    /// Adds a user to the community roster (idempotent)
    pub async fn add(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
        role: CommunityRole,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, CommunityMember>(
            r#"
            INSERT INTO community_members (community_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (community_id, user_id) DO UPDATE SET role = community_members.role
            RETURNING community_id, user_id, role, joined_at
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Removes a user from the community roster
    pub async fn remove(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a community's roster
    pub async fn list(pool: &PgPool, community_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, CommunityMember>(
            r#"
            SELECT community_id, user_id, role, joined_at
            FROM community_members
            WHERE community_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(community_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

impl CommunityTask {
    /// Creates an ad-hoc task inside a community
    pub async fn create(
        pool: &PgPool,
        community_id: Uuid,
        title: &str,
        description: &str,
        assigned_to: Option<Uuid>,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, CommunityTask>(
            r#"
            INSERT INTO community_tasks (community_id, title, description, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, community_id, title, description, status, assigned_to,
                      created_by, created_at
            "#,
        )
        .bind(community_id)
        .bind(title)
        .bind(description)
        .bind(assigned_to)
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Lists a community's tasks, newest first
    pub async fn list(pool: &PgPool, community_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, CommunityTask>(
            r#"
            SELECT id, community_id, title, description, status, assigned_to,
                   created_by, created_at
            FROM community_tasks
            WHERE community_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(community_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task's status and/or assignee
    pub async fn update(
        pool: &PgPool,
        community_id: Uuid,
        id: Uuid,
        status: Option<CommunityTaskStatus>,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, CommunityTask>(
            r#"
            UPDATE community_tasks
            SET status = COALESCE($3, status),
                assigned_to = COALESCE($4, assigned_to)
            WHERE id = $1 AND community_id = $2
            RETURNING id, community_id, title, description, status, assigned_to,
                      created_by, created_at
            "#,
        )
        .bind(id)
        .bind(community_id)
        .bind(status)
        .bind(assigned_to)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, community_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM community_tasks WHERE id = $1 AND community_id = $2",
        )
        .bind(id)
        .bind(community_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ChatMessage {
    /// Posts a message to the community chat
    pub async fn post(
        pool: &PgPool,
        community_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (community_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, community_id, user_id, content, created_at
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Lists recent messages, oldest first within the window
    pub async fn list_recent(
        pool: &PgPool,
        community_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, community_id, user_id, content, created_at
            FROM (
                SELECT id, community_id, user_id, content, created_at
                FROM chat_messages
                WHERE community_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC
            "#,
        )
        .bind(community_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_community_task_status_as_str() {
        assert_eq!(CommunityTaskStatus::Pending.as_str(), "pending");
        assert_eq!(CommunityTaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(CommunityTaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_community_task_status_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&CommunityTaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let status: CommunityTaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, CommunityTaskStatus::Completed);
    }

    #[test]
    fn test_community_role_serde() {
        assert_eq!(
            serde_json::to_string(&CommunityRole::Admin).unwrap(),
            "\"admin\""
        );
    }
}
