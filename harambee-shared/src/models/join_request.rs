/// Club join requests
///
/// A user asks to join a club; a club admin or owner decides. The partial
/// unique index `join_requests_one_pending` guarantees at most one pending
/// request per (club, user) even under concurrent submissions, and both
/// decision paths are conditional on `pending` so a request can only be
/// decided once.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE request_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE join_requests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     club_id UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     status request_status NOT NULL DEFAULT 'pending',
///     message TEXT,
///     requested_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     decided_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX join_requests_one_pending
///     ON join_requests(club_id, user_id)
///     WHERE status = 'pending';
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Join request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// A request to join a club
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JoinRequest {
    pub id: Uuid,
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Pending request joined with requester identity for admin listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JoinRequestInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl JoinRequest {
    /// Submits a join request
    ///
    /// # Errors
    ///
    /// Violates `join_requests_one_pending` if a pending request already
    /// exists; the API maps that constraint to a client error.
    pub async fn create(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, JoinRequest>(
            r#"
            INSERT INTO join_requests (club_id, user_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, club_id, user_id, status, message, requested_at, decided_at
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Finds a request by ID within a club
    pub async fn find_by_id(
        pool: &PgPool,
        club_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, JoinRequest>(
            r#"
            SELECT id, club_id, user_id, status, message, requested_at, decided_at
            FROM join_requests
            WHERE id = $1 AND club_id = $2
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Lists a club's pending requests with requester identities
    pub async fn list_pending(
        pool: &PgPool,
        club_id: Uuid,
    ) -> Result<Vec<JoinRequestInfo>, sqlx::Error> {
        let requests = sqlx::query_as::<_, JoinRequestInfo>(
            r#"
            SELECT jr.id, jr.user_id, u.name, u.email::TEXT AS email,
                   jr.message, jr.requested_at
            FROM join_requests jr
            JOIN users u ON u.id = jr.user_id
            WHERE jr.club_id = $1 AND jr.status = 'pending'
            ORDER BY jr.requested_at ASC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Lists a user's own requests, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, JoinRequest>(
            r#"
            SELECT id, club_id, user_id, status, message, requested_at, decided_at
            FROM join_requests
            WHERE user_id = $1
            ORDER BY requested_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Approves a pending request and adds the requester to the roster
    ///
    /// Decision and roster insert run in one transaction. The UPDATE is
    /// conditional on `pending`: an already-decided request returns `None`
    /// and nothing changes. The roster insert ignores conflicts in case the
    /// user was added through another path in the meantime.
    pub async fn approve(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, JoinRequest>(
            r#"
            UPDATE join_requests
            SET status = 'approved', decided_at = NOW()
            WHERE id = $1 AND club_id = $2 AND status = 'pending'
            RETURNING id, club_id, user_id, status, message, requested_at, decided_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO club_members (club_id, user_id, role)
            VALUES ($1, $2, 'member')
            ON CONFLICT (club_id, user_id) DO NOTHING
            "#,
        )
        .bind(request.club_id)
        .bind(request.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(request))
    }

    /// Rejects a pending request
    ///
    /// Conditional on `pending`; an already-decided request returns `None`.
    pub async fn reject(pool: &PgPool, club_id: Uuid, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, JoinRequest>(
            r#"
            UPDATE join_requests
            SET status = 'rejected', decided_at = NOW()
            WHERE id = $1 AND club_id = $2 AND status = 'pending'
            RETURNING id, club_id, user_id, status, message, requested_at, decided_at
            "#,
        )
        .bind(id)
        .bind(club_id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_as_str() {
        assert_eq!(RequestStatus::Pending.as_str(), "pending");
        assert_eq!(RequestStatus::Approved.as_str(), "approved");
        assert_eq!(RequestStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_request_status_serde() {
        let status: RequestStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, RequestStatus::Pending);
        assert_eq!(
            serde_json::to_string(&RequestStatus::Rejected).unwrap(),
            "\"rejected\""
        );
    }
}
