/// Authorization policy checks
///
/// The single place where club, community, and site-level permissions are
/// decided. Every handler that mutates a club-scoped resource goes through
/// one of these functions instead of repeating inline role comparisons, so
/// the rules cannot drift between endpoints.
///
/// # Permission Model
///
/// 1. **Site role**: `admin` users may approve clubs and moderate accounts
/// 2. **Club membership**: member < admin < owner, resolved per club
/// 3. **Community membership**: member < admin, nested within a club;
///    club admins/owners may also manage any community in their club
/// 4. **Operability**: community tasks/chat/polls accept writes only while
///    the community is approved and not archived
///
/// # Example
///
/// ```no_run
/// use harambee_shared::auth::authorization::require_club_role;
/// use harambee_shared::models::membership::ClubRole;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, club_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Require club admin or owner
/// require_club_role(&pool, club_id, user_id, ClubRole::Admin).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::club::ClubStatus;
use crate::models::community::{Community, CommunityMember, CommunityRole};
use crate::models::membership::{ClubMember, ClubRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the club
    #[error("Not a member of club {0}")]
    NotMember(Uuid),

    /// User doesn't have the required club role
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: ClubRole,
        actual: ClubRole,
    },

    /// User is not a member of the community
    #[error("Not a member of community {0}")]
    NotCommunityMember(Uuid),

    /// Community is not approved (treated as invisible)
    #[error("Community not found")]
    CommunityNotAvailable,

    /// Community is archived and rejects writes
    #[error("Community is archived")]
    CommunityArchived,

    /// Site admin role required
    #[error("Administrator role required")]
    NotSiteAdmin,

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks that a user holds at least `required` within a club
///
/// Returns the user's actual role on success so handlers can branch on it
/// (e.g. owner-only follow-up checks) without a second query.
///
/// # Errors
///
/// - `AuthzError::NotMember` if the user has no membership entry
/// - `AuthzError::InsufficientRole` if the role is below `required`
pub async fn require_club_role(
    pool: &PgPool,
    club_id: Uuid,
    user_id: Uuid,
    required: ClubRole,
) -> Result<ClubRole, AuthzError> {
    let role = ClubMember::get_role(pool, club_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(club_id))?;

    if !role.has_permission(required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: role,
        });
    }

    Ok(role)
}

/// Checks that a user is a member of a club (any role)
pub async fn require_club_membership(
    pool: &PgPool,
    club_id: Uuid,
    user_id: Uuid,
) -> Result<ClubRole, AuthzError> {
    require_club_role(pool, club_id, user_id, ClubRole::Member).await
}

/// Checks that a user is a member of a community (any role)
pub async fn require_community_membership(
    pool: &PgPool,
    community_id: Uuid,
    user_id: Uuid,
) -> Result<CommunityRole, AuthzError> {
    CommunityMember::get_role(pool, community_id, user_id)
        .await?
        .ok_or(AuthzError::NotCommunityMember(community_id))
}

/// Checks that a user may manage a community
///
/// Community admins qualify, and so do admins/owners of the parent club
/// (they manage every community in their club).
pub async fn require_community_manager(
    pool: &PgPool,
    community: &Community,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    if let Some(CommunityRole::Admin) =
        CommunityMember::get_role(pool, community.id, user_id).await?
    {
        return Ok(());
    }

    match require_club_role(pool, community.club_id, user_id, ClubRole::Admin).await {
        Ok(_) => Ok(()),
        Err(AuthzError::NotMember(_)) | Err(AuthzError::InsufficientRole { .. }) => {
            Err(AuthzError::NotCommunityMember(community.id))
        }
        Err(e) => Err(e),
    }
}

/// Checks that a community accepts participation writes
///
/// Tasks, chat, and poll operations succeed only while the community is
/// approved and not archived. A non-approved community is reported as
/// unavailable (404); an archived one is forbidden (403).
pub fn require_operable(community: &Community) -> Result<(), AuthzError> {
    if community.status != ClubStatus::Approved {
        return Err(AuthzError::CommunityNotAvailable);
    }

    if community.is_archived {
        return Err(AuthzError::CommunityArchived);
    }

    Ok(())
}

/// Checks that the authenticated user is a site administrator
pub fn require_site_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_site_admin() {
        return Err(AuthzError::NotSiteAdmin);
    }

    Ok(())
}

/// Checks that the authenticated user owns a resource
///
/// Site admins pass this check for every resource (the "creator or system
/// admin" rule used for personal tasks).
pub fn require_ownership(auth: &AuthContext, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id && !auth.is_site_admin() {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{Claims, TokenType};
    use crate::models::user::UserRole;
    use chrono::Utc;

    fn auth(role: UserRole) -> AuthContext {
        AuthContext::from_claims(&Claims::new(
            Uuid::new_v4(),
            "t@t.com".into(),
            role,
            TokenType::Access,
        ))
    }

    fn community(status: ClubStatus, archived: bool) -> Community {
        Community {
            id: Uuid::new_v4(),
            club_id: Uuid::new_v4(),
            name: "test".into(),
            description: String::new(),
            status,
            is_archived: archived,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_site_admin() {
        assert!(require_site_admin(&auth(UserRole::Admin)).is_ok());
        assert!(matches!(
            require_site_admin(&auth(UserRole::User)),
            Err(AuthzError::NotSiteAdmin)
        ));
    }

    #[test]
    fn test_require_ownership() {
        let ctx = auth(UserRole::User);
        assert!(require_ownership(&ctx, ctx.user_id).is_ok());
        assert!(require_ownership(&ctx, Uuid::new_v4()).is_err());

        // Site admins may touch anyone's resources
        let admin = auth(UserRole::Admin);
        assert!(require_ownership(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_require_operable() {
        assert!(require_operable(&community(ClubStatus::Approved, false)).is_ok());

        assert!(matches!(
            require_operable(&community(ClubStatus::Pending, false)),
            Err(AuthzError::CommunityNotAvailable)
        ));
        assert!(matches!(
            require_operable(&community(ClubStatus::Rejected, false)),
            Err(AuthzError::CommunityNotAvailable)
        ));
        assert!(matches!(
            require_operable(&community(ClubStatus::Approved, true)),
            Err(AuthzError::CommunityArchived)
        ));
    }

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::NotMember(Uuid::new_v4());
        assert!(err.to_string().contains("Not a member"));

        let err = AuthzError::InsufficientRole {
            required: ClubRole::Admin,
            actual: ClubRole::Member,
        };
        assert!(err.to_string().contains("Insufficient permissions"));
    }
}
