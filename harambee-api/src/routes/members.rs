/// Club roster and join-request endpoints
///
/// # Endpoints
///
/// - `GET /v1/clubs/:club_id/members` - Roster (any member)
/// - `PUT /v1/clubs/:club_id/members/:user_id/role` - Promote/demote (owner)
/// - `DELETE /v1/clubs/:club_id/members/:user_id` - Remove member or leave
/// - `POST /v1/clubs/:club_id/join-requests` - Ask to join
/// - `GET /v1/clubs/:club_id/join-requests` - Pending requests (club admin)
/// - `PUT /v1/clubs/:club_id/join-requests/:request_id/approve`
/// - `PUT /v1/clubs/:club_id/join-requests/:request_id/reject`

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use harambee_shared::{
    auth::{
        authorization::{require_club_membership, require_club_role},
        middleware::AuthContext,
    },
    models::{
        club::{Club, ClubLog, ClubStatus},
        join_request::{JoinRequest, JoinRequestInfo},
        membership::{ClubMember, ClubMemberInfo, ClubRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Role change request
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: ClubRole,
}

/// Join request submission
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitJoinRequest {
    #[validate(length(max = 2000, message = "Message too long"))]
    pub message: Option<String>,
}

/// Lists a club's roster (any member)
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ClubMemberInfo>>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let members = ClubMember::list_by_club(&state.db, club_id).await?;

    Ok(Json(members))
}

/// Changes a member's role between `member` and `admin` (club admin)
///
/// The owner's row cannot be changed, and nobody can be promoted to
/// owner through this endpoint.
pub async fn change_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    match ClubMember::get_role(&state.db, club_id, user_id).await? {
        None => {
            return Err(ApiError::NotFound(
                "User is not a member of this club".to_string(),
            ))
        }
        Some(ClubRole::Owner) => {
            return Err(ApiError::BadRequest(
                "Cannot change the owner's role".to_string(),
            ))
        }
        Some(_) => {}
    }

    let changed = ClubMember::set_role(&state.db, club_id, user_id, req.role).await?;
    if !changed {
        return Err(ApiError::BadRequest(
            "Cannot promote a member to owner".to_string(),
        ));
    }

    if let Err(e) = ClubLog::append(
        &state.db,
        club_id,
        Some(auth.user_id),
        "role_changed",
        Some(&format!("{} -> {}", user_id, req.role.as_str())),
    )
    .await
    {
        tracing::warn!(club_id = %club_id, error = %e, "failed to write club log");
    }

    Ok(Json(serde_json::json!({ "message": "Role updated" })))
}

/// Removes a member from the club, or lets a member leave
///
/// Members may remove themselves; removing anyone else takes club admin.
/// The owner can never be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    if user_id != auth.user_id {
        require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;
    } else {
        require_club_membership(&state.db, club_id, auth.user_id).await?;
    }

    match ClubMember::get_role(&state.db, club_id, user_id).await? {
        None => {
            return Err(ApiError::NotFound(
                "User is not a member of this club".to_string(),
            ))
        }
        Some(ClubRole::Owner) => {
            return Err(ApiError::BadRequest(
                "The owner cannot be removed from the club".to_string(),
            ))
        }
        Some(_) => {}
    }

    let removed = ClubMember::remove(&state.db, club_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "User is not a member of this club".to_string(),
        ));
    }

    if let Err(e) = ClubLog::append(
        &state.db,
        club_id,
        Some(auth.user_id),
        "member_removed",
        Some(&user_id.to_string()),
    )
    .await
    {
        tracing::warn!(club_id = %club_id, error = %e, "failed to write club log");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Submits a request to join an approved club
///
/// # Errors
///
/// - `400 Bad Request`: A pending request already exists
/// - `409 Conflict`: Already a member
pub async fn submit_join_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
    Json(req): Json<SubmitJoinRequest>,
) -> ApiResult<(StatusCode, Json<JoinRequest>)> {
    req.validate().map_err(validation_error)?;

    let club = Club::find_by_id(&state.db, club_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Club not found".to_string()))?;
    if club.status != ClubStatus::Approved {
        return Err(ApiError::NotFound("Club not found".to_string()));
    }

    if ClubMember::get_role(&state.db, club_id, auth.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "Already a member of this club".to_string(),
        ));
    }

    let request =
        JoinRequest::create(&state.db, club_id, auth.user_id, req.message.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Lists a club's pending join requests (club admin)
pub async fn list_join_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<JoinRequestInfo>>> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let requests = JoinRequest::list_pending(&state.db, club_id).await?;

    Ok(Json(requests))
}

/// Approves a pending join request (club admin)
///
/// # Errors
///
/// - `409 Conflict`: The request was already decided
pub async fn approve_join_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, request_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<JoinRequest>> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    if JoinRequest::find_by_id(&state.db, club_id, request_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Join request not found".to_string()));
    }

    let request = JoinRequest::approve(&state.db, club_id, request_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Join request already decided".to_string()))?;

    if let Err(e) = ClubLog::append(
        &state.db,
        club_id,
        Some(auth.user_id),
        "member_joined",
        Some(&request.user_id.to_string()),
    )
    .await
    {
        tracing::warn!(club_id = %club_id, error = %e, "failed to write club log");
    }

    Ok(Json(request))
}

/// Rejects a pending join request (club admin)
///
/// # Errors
///
/// - `409 Conflict`: The request was already decided
pub async fn reject_join_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, request_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<JoinRequest>> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    if JoinRequest::find_by_id(&state.db, club_id, request_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Join request not found".to_string()));
    }

    let request = JoinRequest::reject(&state.db, club_id, request_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Join request already decided".to_string()))?;

    Ok(Json(request))
}
