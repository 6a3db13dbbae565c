/// Community endpoints: sub-groups nested in a club
///
/// # Endpoints
///
/// - `GET /v1/clubs/:club_id/communities` - List (members see approved)
/// - `POST /v1/clubs/:club_id/communities` - Propose (starts pending)
/// - `GET /v1/clubs/:club_id/communities/:community_id` - Detail
/// - `DELETE .../:community_id` - Delete (club admin)
/// - `PUT .../:community_id/approve` / `reject` - Decide (club admin)
/// - `PUT .../:community_id/archive` / `unarchive` - Toggle archive (manager)
/// - `POST .../:community_id/join` / `leave` - Roster self-service
/// - `GET .../:community_id/members` - Roster
/// - Task CRUD and chat under `.../:community_id/tasks` and `/chat`

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
            require_club_membership, require_club_role, require_community_manager,
            require_community_membership, require_operable,
        },
        middleware::AuthContext,
    },
    models::{
        club::ClubStatus,
        community::{
            ChatMessage, Community, CommunityMember, CommunityRole, CommunityTask,
            CommunityTaskStatus,
        },
        membership::ClubRole,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Community proposal request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommunityRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,
}

/// Community task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommunityTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub assigned_to: Option<Uuid>,
}

/// Community task update request
#[derive(Debug, Deserialize)]
pub struct UpdateCommunityTaskRequest {
    pub status: Option<CommunityTaskStatus>,
    pub assigned_to: Option<Uuid>,
}

/// Chat message request
#[derive(Debug, Deserialize, Validate)]
pub struct PostChatMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub content: String,
}

/// Loads a community scoped to its club, or 404
async fn load_community(
    state: &AppState,
    club_id: Uuid,
    community_id: Uuid,
) -> Result<Community, ApiError> {
    Community::find_by_id(&state.db, club_id, community_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))
}

/// Checks a user may read a community's content
///
/// Community members qualify, and so do admins of the parent club. An
/// archived community stays readable; a non-approved one does not.
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

/// Lists a club's communities
///
/// Club admins and owners see every community including pending and
/// rejected ones; regular members see only approved communities.
pub async fn list_communities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Community>>> {
    let role = require_club_membership(&state.db, club_id, auth.user_id).await?;

    let communities = if role.has_permission(ClubRole::Admin) {
        Community::list_all(&state.db, club_id).await?
    } else {
        Community::list_approved(&state.db, club_id).await?
    };

    Ok(Json(communities))
}

/// Proposes a new community (any club member)
///
/// The community starts `pending`; a club admin decides. The proposer is
/// seeded onto the roster as community admin.
pub async fn create_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
    Json(req): Json<CreateCommunityRequest>,
) -> ApiResult<(StatusCode, Json<Community>)> {
    req.validate().map_err(validation_error)?;

    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let community = Community::create(
        &state.db,
        club_id,
        &req.name,
        req.description.as_deref().unwrap_or(""),
        auth.user_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(community)))
}

/// Returns one community
pub async fn get_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Community>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let community = load_community(&state, club_id, community_id).await?;

    // Pending and rejected communities are visible only to the proposer
    // and club managers.
    if community.status != ClubStatus::Approved && community.created_by != auth.user_id {
        require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin)
            .await
            .map_err(|_| ApiError::NotFound("Community not found".to_string()))?;
    }

    Ok(Json(community))
}

/// Deletes a community and its contents (club admin)
pub async fn delete_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let deleted = Community::delete(&state.db, club_id, community_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Community not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Approves a pending community (club admin)
///
/// # Errors
///
/// - `409 Conflict`: Already decided
pub async fn approve_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Community>> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    load_community(&state, club_id, community_id).await?;

    let community = Community::approve(&state.db, club_id, community_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Community already decided".to_string()))?;

    Ok(Json(community))
}

/// Rejects a pending community (club admin)
///
/// # Errors
///
/// - `409 Conflict`: Already decided
pub async fn reject_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Community>> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    load_community(&state, club_id, community_id).await?;

    let community = Community::reject(&state.db, club_id, community_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Community already decided".to_string()))?;

    Ok(Json(community))
}

/// Archives a community (community admin or club admin)
///
/// Archived communities reject task, chat, and poll writes but stay
/// readable.
pub async fn archive_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Community>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_community_manager(&state.db, &community, auth.user_id).await?;

    let community = Community::set_archived(&state.db, club_id, community_id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    Ok(Json(community))
}

/// Restores an archived community
pub async fn unarchive_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Community>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_community_manager(&state.db, &community, auth.user_id).await?;

    let community = Community::set_archived(&state.db, club_id, community_id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("Community not found".to_string()))?;

    Ok(Json(community))
}

/// Joins an approved community (any club member)
pub async fn join_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<(StatusCode, Json<CommunityMember>)> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;

    if CommunityMember::get_role(&state.db, community_id, auth.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Already a member of this community".to_string(),
        ));
    }

    let member =
        CommunityMember::add(&state.db, community_id, auth.user_id, CommunityRole::Member).await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Leaves a community
pub async fn leave_community(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    load_community(&state, club_id, community_id).await?;

    let removed = CommunityMember::remove(&state.db, community_id, auth.user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Not a member of this community".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a community's roster
pub async fn list_community_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<CommunityMember>>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_readable(&state, &community, auth.user_id).await?;

    let members = CommunityMember::list(&state.db, community_id).await?;

    Ok(Json(members))
}

/// Lists a community's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<CommunityTask>>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_readable(&state, &community, auth.user_id).await?;

    let tasks = CommunityTask::list(&state.db, community_id).await?;

    Ok(Json(tasks))
}

/// Creates a task in a community (any community member)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateCommunityTaskRequest>,
) -> ApiResult<(StatusCode, Json<CommunityTask>)> {
    req.validate().map_err(validation_error)?;

    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;
    require_community_membership(&state.db, community_id, auth.user_id).await?;

    let task = CommunityTask::create(
        &state.db,
        community_id,
        &req.title,
        req.description.as_deref().unwrap_or(""),
        req.assigned_to,
        auth.user_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Updates a task's status or assignee
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<UpdateCommunityTaskRequest>,
) -> ApiResult<Json<CommunityTask>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;
    require_community_membership(&state.db, community_id, auth.user_id).await?;

    let task = CommunityTask::update(&state.db, community_id, task_id, req.status, req.assigned_to)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Deletes a task (community manager)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id, task_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;
    require_community_manager(&state.db, &community, auth.user_id).await?;

    let deleted = CommunityTask::delete(&state.db, community_id, task_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists recent chat messages, oldest first within the window
pub async fn list_chat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let community = load_community(&state, club_id, community_id).await?;
    require_readable(&state, &community, auth.user_id).await?;

    let messages = ChatMessage::list_recent(&state.db, community_id, 100).await?;

    Ok(Json(messages))
}

/// Posts a chat message (community member, community operable)
pub async fn post_chat_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, community_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<PostChatMessageRequest>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    req.validate().map_err(validation_error)?;

    let community = load_community(&state, club_id, community_id).await?;
    require_operable(&community)?;
    require_community_membership(&state.db, community_id, auth.user_id).await?;

    let message = ChatMessage::post(&state.db, community_id, auth.user_id, &req.content).await?;

    Ok((StatusCode::CREATED, Json(message)))
}
