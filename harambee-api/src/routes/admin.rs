/// Site administration endpoints (admin role)
///
/// # Endpoints
///
/// - `GET /v1/admin/users` - Paginated account listing
/// - `PUT /v1/admin/users/:user_id/block` / `unblock` - Moderate accounts
/// - `PUT /v1/admin/users/:user_id/role` - Grant or revoke site admin
/// - `DELETE /v1/admin/users/:user_id` - Delete an account
/// - `GET /v1/admin/clubs?status=pending` - Clubs awaiting decision
/// - `POST /v1/admin/clubs/:club_id/approve` / `reject` - Decide clubs
/// - `GET /v1/admin/stats` - Platform counters

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use harambee_shared::{
    auth::{authorization::require_site_admin, middleware::AuthContext},
    models::{
        club::{Club, ClubLog, ClubStatus},
        task::{Task, TaskStatus},
        user::{User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pagination for the account listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Club listing filter
#[derive(Debug, Deserialize)]
pub struct ListClubsQuery {
    pub status: Option<ClubStatus>,
}

/// Site role change request
#[derive(Debug, Deserialize)]
pub struct ChangeUserRoleRequest {
    pub role: UserRole,
}

/// Paginated account listing
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
}

/// Platform counters
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_users: i64,
    pub pending_clubs: i64,
    pub approved_clubs: i64,
    pub rejected_clubs: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
}

/// Lists accounts, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UserListResponse>> {
    require_site_admin(&auth)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let users = User::list(&state.db, limit, offset).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(UserListResponse { users, total }))
}

/// Blocks an account; takes effect on the user's next request
pub async fn block_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_site_admin(&auth)?;

    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot block your own account".to_string(),
        ));
    }

    let user = User::set_blocked(&state.db, user_id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user_id, admin_id = %auth.user_id, "account blocked");

    Ok(Json(user))
}

/// Unblocks an account
pub async fn unblock_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    require_site_admin(&auth)?;

    let user = User::set_blocked(&state.db, user_id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user_id, admin_id = %auth.user_id, "account unblocked");

    Ok(Json(user))
}

/// Changes an account's site role
///
/// Takes effect on the target's next request since the auth layer reads
/// the role from the database.
pub async fn change_user_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangeUserRoleRequest>,
) -> ApiResult<Json<User>> {
    require_site_admin(&auth)?;

    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot change your own role".to_string(),
        ));
    }

    let user = User::set_role(&state.db, user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Deletes an account and everything it created (CASCADE)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_site_admin(&auth)?;

    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let deleted = User::delete(&state.db, user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user_id, admin_id = %auth.user_id, "account deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Lists clubs by status; defaults to pending
pub async fn list_clubs_by_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListClubsQuery>,
) -> ApiResult<Json<Vec<Club>>> {
    require_site_admin(&auth)?;

    let status = query.status.unwrap_or(ClubStatus::Pending);
    let clubs = Club::list_by_status(&state.db, status).await?;

    Ok(Json(clubs))
}

/// Approves a pending club
///
/// The creator is seeded as owner in the same transaction.
///
/// # Errors
///
/// - `409 Conflict`: The club was already decided
pub async fn approve_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Club>> {
    require_site_admin(&auth)?;

    if Club::find_by_id(&state.db, club_id).await?.is_none() {
        return Err(ApiError::NotFound("Club not found".to_string()));
    }

    let club = Club::approve(&state.db, club_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Club already decided".to_string()))?;

    if let Err(e) = ClubLog::append(&state.db, club_id, Some(auth.user_id), "approved", None).await
    {
        tracing::warn!(club_id = %club_id, error = %e, "failed to write club log");
    }

    Ok(Json(club))
}

/// Rejects a pending club; terminal
///
/// # Errors
///
/// - `409 Conflict`: The club was already decided
pub async fn reject_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Club>> {
    require_site_admin(&auth)?;

    if Club::find_by_id(&state.db, club_id).await?.is_none() {
        return Err(ApiError::NotFound("Club not found".to_string()));
    }

    let club = Club::reject(&state.db, club_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Club already decided".to_string()))?;

    Ok(Json(club))
}

/// Platform counters
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<StatsResponse>> {
    require_site_admin(&auth)?;

    let total_users = User::count(&state.db).await?;
    let pending_clubs = Club::count_by_status(&state.db, ClubStatus::Pending).await?;
    let approved_clubs = Club::count_by_status(&state.db, ClubStatus::Approved).await?;
    let rejected_clubs = Club::count_by_status(&state.db, ClubStatus::Rejected).await?;
    let pending_tasks = Task::count_by_status(&state.db, TaskStatus::Pending).await?;
    let in_progress_tasks = Task::count_by_status(&state.db, TaskStatus::InProgress).await?;
    let completed_tasks = Task::count_by_status(&state.db, TaskStatus::Completed).await?;

    Ok(Json(StatsResponse {
        total_users,
        pending_clubs,
        approved_clubs,
        rejected_clubs,
        pending_tasks,
        in_progress_tasks,
        completed_tasks,
    }))
}
