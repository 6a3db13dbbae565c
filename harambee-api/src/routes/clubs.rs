/// Club endpoints
///
/// # Endpoints
///
/// - `GET /v1/clubs` - List approved clubs
/// - `POST /v1/clubs` - Request a new club (starts pending)
/// - `GET /v1/clubs/mine` - Clubs the user belongs to
/// - `GET /v1/clubs/:club_id` - Club detail
/// - `PUT /v1/clubs/:club_id` - Update descriptive fields (club admin)
/// - `DELETE /v1/clubs/:club_id` - Delete club (owner or site admin)
/// - `GET /v1/clubs/:club_id/logs` - Club activity log (club admin)

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
        club::{Club, ClubLog, ClubStatus, CreateClub},
        membership::ClubRole,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Club creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClubRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    #[validate(length(max = 5000, message = "Purpose too long"))]
    pub purpose: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,
}

/// Club update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClubRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    #[validate(length(max = 5000, message = "Purpose too long"))]
    pub purpose: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,
}

/// Lists approved clubs
pub async fn list_clubs(State(state): State<AppState>) -> ApiResult<Json<Vec<Club>>> {
    let clubs = Club::list_approved(&state.db).await?;

    Ok(Json(clubs))
}

/// Requests a new club
///
/// The club starts `pending` and is not listed until a site administrator
/// approves it. The creator becomes owner at approval time.
pub async fn create_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateClubRequest>,
) -> ApiResult<(StatusCode, Json<Club>)> {
    req.validate().map_err(validation_error)?;

    let club = Club::create(
        &state.db,
        CreateClub {
            name: req.name,
            description: req.description.unwrap_or_default(),
            purpose: req.purpose.unwrap_or_default(),
            category: req.category.unwrap_or_else(|| "general".to_string()),
            created_by: auth.user_id,
        },
    )
    .await?;

    if let Err(e) = ClubLog::append(&state.db, club.id, Some(auth.user_id), "created", None).await {
        tracing::warn!(club_id = %club.id, error = %e, "failed to write club log");
    }

    Ok((StatusCode::CREATED, Json(club)))
}

/// Lists the approved clubs the user belongs to
pub async fn list_my_clubs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Club>>> {
    let clubs = Club::list_for_member(&state.db, auth.user_id).await?;

    Ok(Json(clubs))
}

/// Returns one club
///
/// A club that has not been approved is visible only to its creator and
/// site administrators; everyone else sees 404.
pub async fn get_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Club>> {
    let club = Club::find_by_id(&state.db, club_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Club not found".to_string()))?;

    if club.status != ClubStatus::Approved
        && club.created_by != auth.user_id
        && !auth.is_site_admin()
    {
        return Err(ApiError::NotFound("Club not found".to_string()));
    }

    Ok(Json(club))
}

/// Updates a club's descriptive fields (club admin or owner)
pub async fn update_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
    Json(req): Json<UpdateClubRequest>,
) -> ApiResult<Json<Club>> {
    req.validate().map_err(validation_error)?;

    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let club = Club::update(
        &state.db,
        club_id,
        req.name.as_deref(),
        req.description.as_deref(),
        req.purpose.as_deref(),
        req.category.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Club not found".to_string()))?;

    if let Err(e) = ClubLog::append(&state.db, club_id, Some(auth.user_id), "updated", None).await {
        tracing::warn!(club_id = %club_id, error = %e, "failed to write club log");
    }

    Ok(Json(club))
}

/// Deletes a club (owner or site admin)
///
/// Everything nested under the club goes with it.
pub async fn delete_club(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !auth.is_site_admin() {
        require_club_role(&state.db, club_id, auth.user_id, ClubRole::Owner).await?;
    }

    let deleted = Club::delete(&state.db, club_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Club not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a club's activity log (any member)
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ClubLog>>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let logs = ClubLog::list_by_club(&state.db, club_id, 100).await?;

    Ok(Json(logs))
}
