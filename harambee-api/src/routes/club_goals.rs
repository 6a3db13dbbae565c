/// Simple club goal endpoints
///
/// Lightweight goal entries attached directly to a club. The structured
/// planning hierarchy lives under `/v1/goals`.
///
/// # Endpoints
///
/// - `GET /v1/clubs/:club_id/goals` - List
/// - `POST /v1/clubs/:club_id/goals` - Create (club admin)
/// - `PUT /v1/clubs/:club_id/goals/:goal_id` - Edit (club admin)
/// - `DELETE /v1/clubs/:club_id/goals/:goal_id` - Remove (club admin)

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
    models::{club_goal::ClubGoal, membership::ClubRole},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Goal creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClubGoalRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,
}

/// Goal edit request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClubGoalRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,
}

/// Lists a club's goals (any member)
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ClubGoal>>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let goals = ClubGoal::list(&state.db, club_id).await?;

    Ok(Json(goals))
}

/// Creates a goal (club admin)
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
    Json(req): Json<CreateClubGoalRequest>,
) -> ApiResult<(StatusCode, Json<ClubGoal>)> {
    req.validate().map_err(validation_error)?;

    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let goal = ClubGoal::create(
        &state.db,
        club_id,
        &req.title,
        req.description.as_deref().unwrap_or(""),
        auth.user_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// Edits a goal (club admin)
pub async fn update_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, goal_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateClubGoalRequest>,
) -> ApiResult<Json<ClubGoal>> {
    req.validate().map_err(validation_error)?;

    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let goal = ClubGoal::update(
        &state.db,
        club_id,
        goal_id,
        req.title.as_deref(),
        req.description.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Goal not found".to_string()))?;

    Ok(Json(goal))
}

/// Deletes a goal (club admin)
pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, goal_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let deleted = ClubGoal::delete(&state.db, club_id, goal_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Goal not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
