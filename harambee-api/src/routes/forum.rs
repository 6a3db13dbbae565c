/// Club forum endpoints
///
/// # Endpoints
///
/// - `GET /v1/clubs/:club_id/topics` - List topics
/// - `POST /v1/clubs/:club_id/topics` - Open a topic
/// - `GET /v1/clubs/:club_id/topics/:topic_id` - Topic with replies
/// - `PUT /v1/clubs/:club_id/topics/:topic_id` - Edit (author)
/// - `DELETE /v1/clubs/:club_id/topics/:topic_id` - Remove (author or admin)
/// - `POST .../:topic_id/replies` - Reply
/// - `DELETE .../:topic_id/replies/:reply_id` - Remove reply

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
        forum::{Topic, TopicReply},
        membership::ClubRole,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Topic creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 20000, message = "Content must be 1-20000 characters"))]
    pub content: String,
}

/// Topic edit request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTopicRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 20000, message = "Content must be 1-20000 characters"))]
    pub content: Option<String>,
}

/// Reply creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 20000, message = "Content must be 1-20000 characters"))]
    pub content: String,
}

/// Topic detail with its replies
#[derive(Debug, Serialize)]
pub struct TopicDetail {
    #[serde(flatten)]
    pub topic: Topic,
    pub replies: Vec<TopicReply>,
}

/// Lists a club's topics (any member)
pub async fn list_topics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Topic>>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let topics = Topic::list(&state.db, club_id).await?;

    Ok(Json(topics))
}

/// Opens a new topic (any member)
pub async fn create_topic(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
    Json(req): Json<CreateTopicRequest>,
) -> ApiResult<(StatusCode, Json<Topic>)> {
    req.validate().map_err(validation_error)?;

    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let topic = Topic::create(&state.db, club_id, &req.title, &req.content, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(topic)))
}

/// Returns a topic with its replies
pub async fn get_topic(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, topic_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<TopicDetail>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let topic = Topic::find_by_id(&state.db, club_id, topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    let replies = TopicReply::list(&state.db, topic_id).await?;

    Ok(Json(TopicDetail { topic, replies }))
}

/// Edits a topic (author only)
pub async fn update_topic(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, topic_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateTopicRequest>,
) -> ApiResult<Json<Topic>> {
    req.validate().map_err(validation_error)?;

    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let topic = Topic::find_by_id(&state.db, club_id, topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    if topic.created_by != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the author may edit this topic".to_string(),
        ));
    }

    let topic = Topic::update(
        &state.db,
        club_id,
        topic_id,
        req.title.as_deref(),
        req.content.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    Ok(Json(topic))
}

/// Deletes a topic and its replies (author or club admin)
pub async fn delete_topic(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, topic_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let topic = Topic::find_by_id(&state.db, club_id, topic_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    if topic.created_by != auth.user_id {
        require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;
    }

    Topic::delete(&state.db, club_id, topic_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Adds a reply to a topic (any member)
pub async fn create_reply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, topic_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateReplyRequest>,
) -> ApiResult<(StatusCode, Json<TopicReply>)> {
    req.validate().map_err(validation_error)?;

    require_club_membership(&state.db, club_id, auth.user_id).await?;

    if Topic::find_by_id(&state.db, club_id, topic_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Topic not found".to_string()));
    }

    let reply = TopicReply::create(&state.db, topic_id, &req.content, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// Deletes a reply (author or club admin)
pub async fn delete_reply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, topic_id, reply_id)): Path<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    if Topic::find_by_id(&state.db, club_id, topic_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Topic not found".to_string()));
    }

    let reply = TopicReply::find_by_id(&state.db, topic_id, reply_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reply not found".to_string()))?;

    if reply.created_by != auth.user_id {
        require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;
    }

    TopicReply::delete(&state.db, topic_id, reply_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
