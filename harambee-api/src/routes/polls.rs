/// Community poll endpoints
///
/// # Endpoints
///
/// - `GET /v1/clubs/:club_id/communities/:community_id/polls` - List
/// - `POST .../polls` - Create a poll with its options
/// - `GET .../polls/:poll_id` - Poll with options, tallies, own vote
/// - `POST .../polls/:poll_id/vote` - Cast a vote (one per user)
/// - `PUT .../polls/:poll_id/close` - Close voting (manager)

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
        authorization::{
            require_club_role, require_community_manager, require_community_membership,
            require_operable,
        },
        middleware::AuthContext,
    },
    models::{
        club::ClubStatus,
        community::{Community, CommunityMember},
        membership::ClubRole,
        poll::{OptionTally, Poll, PollOption, PollVote},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Poll creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePollRequest {
    #[validate(length(min = 1, max = 1000, message = "Question must be 1-1000 characters"))]
    pub question: String,

    #[validate(length(min = 2, max = 20, message = "A poll needs 2-20 options"))]
    pub options: Vec<String>,
}

/// Vote request
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: Uuid,
}

/// Poll detail with options, tallies, and the caller's vote
#[derive(Debug, Serialize)]
pub struct PollDetail {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
    pub tally: Vec<OptionTally>,
    pub my_vote: Option<Uuid>,
}

async fn load_community(
    state: &AppState,
    club_id: Uuid,
    community_id: Uuid,
) -> Result<Community, ApiError> {
    Community::find_by_id(&state.db, club_id, community_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))
}

/// Checks poll read access: community member or club admin
async fn require_readable(
    state: &AppState,
    community: &Community,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if community.status != ClubStatus::Approved {
        return Err(ApiError::NotFound("Community not found".to_string()));
    }

    if CommunityMember::get_role(&state.db, community.id, user_id)
        .await?
        .is_some()
    {
        return Ok(());
    }

    require_club_role(&state.db, community.club_id, user_id, ClubRole::Admin).await?;

    Ok(())
}

/// Lists a community's polls
pub async fn list_polls(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<Poll>>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_readable(&state, &community, auth.user_id).await?;

    let polls = Poll::list(&state.db, community_id).await?;

    Ok(Json(polls))
}

/// Creates a poll with its options (any community member)
pub async fn create_poll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreatePollRequest>,
) -> ApiResult<(StatusCode, Json<PollDetail>)> {
    req.validate().map_err(validation_error)?;

    if req.options.iter().any(|o| o.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Poll options cannot be empty".to_string(),
        ));
    }

    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;
    require_community_membership(&state.db, community_id, auth.user_id).await?;

    let (poll, options) = Poll::create(
        &state.db,
        community_id,
        &req.question,
        &req.options,
        auth.user_id,
    )
    .await?;

    let tally = Poll::tally(&state.db, poll.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(PollDetail {
            poll,
            options,
            tally,
            my_vote: None,
        }),
    ))
}

/// Returns one poll with options, tallies, and the caller's vote
pub async fn get_poll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id, poll_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<PollDetail>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_readable(&state, &community, auth.user_id).await?;

    let poll = Poll::find_by_id(&state.db, community_id, poll_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Poll not found".to_string()))?;

    let options = Poll::options(&state.db, poll.id).await?;
    let tally = Poll::tally(&state.db, poll.id).await?;
    let my_vote = PollVote::find(&state.db, poll.id, auth.user_id)
        .await?
        .map(|v| v.option_id);

    Ok(Json(PollDetail {
        poll,
        options,
        tally,
        my_vote,
    }))
}

/// Casts a vote on an open poll
///
/// One vote per user, enforced by the vote table's primary key; a second
/// vote surfaces as a client error.
///
/// # Errors
///
/// - `400 Bad Request`: Already voted, the poll is closed, or the option
///   is not in this poll
pub async fn vote(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id, poll_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<(StatusCode, Json<PollVote>)> {
    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;
    require_community_membership(&state.db, community_id, auth.user_id).await?;

    let poll = Poll::find_by_id(&state.db, community_id, poll_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Poll not found".to_string()))?;

    if poll.is_closed {
        return Err(ApiError::BadRequest("Poll is closed".to_string()));
    }

    let cast = PollVote::cast(&state.db, poll_id, req.option_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Option does not belong to this poll".to_string()))?;

    Ok((StatusCode::CREATED, Json(cast)))
}

/// Closes a poll (community manager); idempotent
pub async fn close_poll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id, poll_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<Poll>> {
    let community = load_community(&state, club_id, community_id).await?;

    let poll = Poll::find_by_id(&state.db, community_id, poll_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Poll not found".to_string()))?;

    // The poll's creator may close it; anyone else needs manager rights
    if poll.created_by != auth.user_id && !auth.is_site_admin() {
        require_community_manager(&state.db, &community, auth.user_id).await?;
    }

    let poll = Poll::close(&state.db, community_id, poll_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Poll not found".to_string()))?;

    Ok(Json(poll))
}
