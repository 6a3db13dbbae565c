/// Club model, approval state machine, and club logs
///
/// A club starts `pending` and becomes visible to members only after a site
/// administrator approves it. Approval also repairs the roster: the creator
/// is seeded as `owner` in the same transaction, so an approved club always
/// has exactly one owner.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE club_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE clubs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     purpose TEXT NOT NULL DEFAULT '',
///     category VARCHAR(100) NOT NULL DEFAULT 'general',
///     status club_status NOT NULL DEFAULT 'pending',
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::ClubRole;

/// Club approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "club_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClubStatus {
    /// Awaiting an administrator's decision
    Pending,

    /// Approved and visible
    Approved,

    /// Rejected; terminal, the decision cannot be revisited
    Rejected,
}

impl ClubStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubStatus::Pending => "pending",
            ClubStatus::Approved => "approved",
            ClubStatus::Rejected => "rejected",
        }
    }

    /// Checks whether a decision transition is valid
    ///
    /// Only `pending` accepts a decision; both outcomes are terminal.
    pub fn can_transition_to(&self, next: ClubStatus) -> bool {
        matches!(
            (self, next),
            (ClubStatus::Pending, ClubStatus::Approved) | (ClubStatus::Pending, ClubStatus::Rejected)
        )
    }
}

/// A club
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Club {
    /// Unique club ID
    pub id: Uuid,

    /// Club name
    pub name: String,

    /// Description shown in listings
    pub description: String,

    /// Statement of what the club is for
    pub purpose: String,

    /// Category label
    pub category: String,

    /// Approval status
    pub status: ClubStatus,

    /// User who requested the club; becomes owner on approval
    pub created_by: Uuid,

    /// When the club was created
    pub created_at: DateTime<Utc>,

    /// When the club was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a club
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClub {
    pub name: String,
    pub description: String,
    pub purpose: String,
    pub category: String,
    pub created_by: Uuid,
}

/// An entry in a club's activity log
///
/// Club logs are best-effort annotations: a failed log write never fails
/// the operation that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClubLog {
    pub id: Uuid,
    pub club_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Club {
    /// Creates a new club in `pending` status
    pub async fn create(pool: &PgPool, data: CreateClub) -> Result<Self, sqlx::Error> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            INSERT INTO clubs (name, description, purpose, category, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, purpose, category, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.purpose)
        .bind(data.category)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(club)
    }

    /// Finds a club by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, description, purpose, category, status, created_by,
                   created_at, updated_at
            FROM clubs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(club)
    }

    /// Lists approved clubs, newest first
    pub async fn list_approved(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, description, purpose, category, status, created_by,
                   created_at, updated_at
            FROM clubs
            WHERE status = 'approved'
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(clubs)
    }

    /// Lists clubs by status (admin surface)
    pub async fn list_by_status(
        pool: &PgPool,
        status: ClubStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, description, purpose, category, status, created_by,
                   created_at, updated_at
            FROM clubs
            WHERE status = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(clubs)
    }

    /// Lists the approved clubs a user is a member of
    pub async fn list_for_member(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT c.id, c.name, c.description, c.purpose, c.category, c.status,
                   c.created_by, c.created_at, c.updated_at
            FROM clubs c
            JOIN club_members cm ON cm.club_id = c.id
            WHERE cm.user_id = $1 AND c.status = 'approved'
            ORDER BY cm.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(clubs)
    }

    /// Updates a club's descriptive fields
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        purpose: Option<&str>,
        category: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            UPDATE clubs
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                purpose = COALESCE($4, purpose),
                category = COALESCE($5, category),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, purpose, category, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(purpose)
        .bind(category)
        .fetch_optional(pool)
        .await?;

        Ok(club)
    }

    /// Approves a pending club and seeds the creator as owner
    ///
    /// Both steps run in one transaction. The status UPDATE is conditional
    /// on `pending`, so a club that was already decided returns `None` and
    /// the roster is untouched. The owner insert is an upsert: if the
    /// creator somehow already sits on the roster their role is raised to
    /// `owner` rather than duplicated.
    pub async fn approve(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let club = sqlx::query_as::<_, Club>(
            r#"
            UPDATE clubs
            SET status = 'approved', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, name, description, purpose, category, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(club) = club else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO club_members (club_id, user_id, role)
            VALUES ($1, $2, 'owner')
            ON CONFLICT (club_id, user_id) DO UPDATE SET role = 'owner'
            "#,
        )
        .bind(club.id)
        .bind(club.created_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(club))
    }

    /// Rejects a pending club
    ///
    /// Conditional on `pending`: a club that was already decided returns
    /// `None`. Rejection is terminal.
    pub async fn reject(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            UPDATE clubs
            SET status = 'rejected', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, name, description, purpose, category, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(club)
    }

    /// Deletes a club and everything under it (CASCADE)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clubs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts clubs by status (admin stats)
    pub async fn count_by_status(pool: &PgPool, status: ClubStatus) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clubs WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Returns whether a user may edit the club (club admin or owner)
    pub async fn can_manage(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let role = super::membership::ClubMember::get_role(pool, club_id, user_id).await?;
        Ok(matches!(role, Some(r) if r.has_permission(ClubRole::Admin)))
    }
}

impl ClubLog {
    /// Appends a log entry
    ///
    /// Callers treat a failure here as non-fatal and only log it.
    pub async fn append(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Option<Uuid>,
        action: &str,
        details: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let log = sqlx::query_as::<_, ClubLog>(
            r#"
            INSERT INTO club_logs (club_id, user_id, action, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id, club_id, user_id, action, details, created_at
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .bind(action)
        .bind(details)
        .fetch_one(pool)
        .await?;

        Ok(log)
    }

    /// Lists a club's log entries, newest first
    pub async fn list_by_club(
        pool: &PgPool,
        club_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let logs = sqlx::query_as::<_, ClubLog>(
            r#"
            SELECT id, club_id, user_id, action, details, created_at
            FROM club_logs
            WHERE club_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(club_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_club_status_as_str() {
        assert_eq!(ClubStatus::Pending.as_str(), "pending");
        assert_eq!(ClubStatus::Approved.as_str(), "approved");
        assert_eq!(ClubStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_decision_transitions() {
        assert!(ClubStatus::Pending.can_transition_to(ClubStatus::Approved));
        assert!(ClubStatus::Pending.can_transition_to(ClubStatus::Rejected));
    }

    #[test]
    fn test_decisions_are_terminal() {
        assert!(!ClubStatus::Approved.can_transition_to(ClubStatus::Rejected));
        assert!(!ClubStatus::Approved.can_transition_to(ClubStatus::Pending));
        assert!(!ClubStatus::Rejected.can_transition_to(ClubStatus::Approved));
        assert!(!ClubStatus::Rejected.can_transition_to(ClubStatus::Pending));
    }
}
