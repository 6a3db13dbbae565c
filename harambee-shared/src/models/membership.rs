/// Club membership roster and roles
///
/// Membership is a (club, user) pair with a role. The creator of a club is
/// seeded as `owner` when the club is approved; exactly one owner exists per
/// club and the owner can never be demoted or removed through the roster
/// operations here.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE club_role AS ENUM ('member', 'admin', 'owner');
///
/// CREATE TABLE club_members (
///     club_id UUID NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role club_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (club_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role within a club
///
/// Roles form a strict hierarchy: member < admin < owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "club_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClubRole {
    /// Regular club member
    Member,

    /// Club administrator: manages roster, content, communities
    Admin,

    /// Club owner: everything an admin can do, plus role management
    Owner,
}

impl ClubRole {
    /// Returns the permission level (higher = more permissions)
    pub fn permission_level(&self) -> u8 {
        match self {
            ClubRole::Member => 1,
            ClubRole::Admin => 2,
            ClubRole::Owner => 3,
        }
    }

    /// Checks whether this role satisfies the required role
    pub fn has_permission(self, required: ClubRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClubRole::Member => "member",
            ClubRole::Admin => "admin",
            ClubRole::Owner => "owner",
        }
    }
}

/// A club roster entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClubMember {
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub role: ClubRole,
    pub joined_at: DateTime<Utc>,
}

/// Roster entry joined with user identity for listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClubMemberInfo {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ClubRole,
    pub joined_at: DateTime<Utc>,
}

impl ClubMember {
    /// Adds a user to a club roster
    ///
    /// Idempotent: re-adding an existing member keeps the current role.
    pub async fn add(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
        role: ClubRole,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, ClubMember>(
            r#"
            INSERT INTO club_members (club_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (club_id, user_id) DO UPDATE SET role = club_members.role
            RETURNING club_id, user_id, role, joined_at
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Resolves a user's role within a club, if they are a member
    pub async fn get_role(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ClubRole>, sqlx::Error> {
        let role: Option<(ClubRole,)> = sqlx::query_as(
            "SELECT role FROM club_members WHERE club_id = $1 AND user_id = $2",
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role.map(|(r,)| r))
    }

    /// Lists a club's roster with user identities, owner first
    pub async fn list_by_club(
        pool: &PgPool,
        club_id: Uuid,
    ) -> Result<Vec<ClubMemberInfo>, sqlx::Error> {
        let members = sqlx::query_as::<_, ClubMemberInfo>(
            r#"
            SELECT cm.user_id, u.name, u.email::TEXT AS email, cm.role, cm.joined_at
            FROM club_members cm
            JOIN users u ON u.id = cm.user_id
            WHERE cm.club_id = $1
            ORDER BY cm.role DESC, cm.joined_at ASC
            "#,
        )
        .bind(club_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists the clubs a user belongs to
    pub async fn list_clubs_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ClubMember>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, ClubMember>(
            r#"
            SELECT club_id, user_id, role, joined_at
            FROM club_members
            WHERE user_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Changes a member's role between `member` and `admin`
    ///
    /// The owner row is excluded from the update, so an attempt to demote
    /// the owner affects zero rows and the caller reports it as invalid.
    /// Promoting *to* owner is likewise not possible through this path.
    pub async fn set_role(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
        role: ClubRole,
    ) -> Result<bool, sqlx::Error> {
        if role == ClubRole::Owner {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            UPDATE club_members
            SET role = $3
            WHERE club_id = $1 AND user_id = $2 AND role <> 'owner'
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a member from the club and every community roster in it
    ///
    /// The owner row is excluded, so removing the owner affects zero rows.
    /// Both deletes run in one transaction: leaving a club always leaves
    /// its communities too.
    pub async fn remove(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
            DELETE FROM club_members
            WHERE club_id = $1 AND user_id = $2 AND role <> 'owner'
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM community_members
            WHERE user_id = $2
              AND community_id IN (SELECT id FROM communities WHERE club_id = $1)
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Counts a club's members
    pub async fn count_by_club(pool: &PgPool, club_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM club_members WHERE club_id = $1")
                .bind(club_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_levels_are_ordered() {
        assert!(ClubRole::Member.permission_level() < ClubRole::Admin.permission_level());
        assert!(ClubRole::Admin.permission_level() < ClubRole::Owner.permission_level());
    }

    #[test]
    fn test_has_permission_hierarchy() {
        assert!(ClubRole::Owner.has_permission(ClubRole::Member));
        assert!(ClubRole::Owner.has_permission(ClubRole::Admin));
        assert!(ClubRole::Owner.has_permission(ClubRole::Owner));

        assert!(ClubRole::Admin.has_permission(ClubRole::Member));
        assert!(ClubRole::Admin.has_permission(ClubRole::Admin));
        assert!(!ClubRole::Admin.has_permission(ClubRole::Owner));

        assert!(ClubRole::Member.has_permission(ClubRole::Member));
        assert!(!ClubRole::Member.has_permission(ClubRole::Admin));
        assert!(!ClubRole::Member.has_permission(ClubRole::Owner));
    }

    #[test]
    fn test_club_role_as_str() {
        assert_eq!(ClubRole::Member.as_str(), "member");
        assert_eq!(ClubRole::Admin.as_str(), "admin");
        assert_eq!(ClubRole::Owner.as_str(), "owner");
    }

    #[test]
    fn test_club_role_serde() {
        assert_eq!(serde_json::to_string(&ClubRole::Owner).unwrap(), "\"owner\"");
        let role: ClubRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, ClubRole::Admin);
    }
}
