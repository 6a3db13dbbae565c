/// Club knowledge-base endpoints
///
/// # Endpoints
///
/// - `GET /v1/clubs/:club_id/articles` - List articles
/// - `POST /v1/clubs/:club_id/articles` - Create (club admin)
/// - `GET /v1/clubs/:club_id/articles/:article_id` - Read
/// - `PUT /v1/clubs/:club_id/articles/:article_id` - Edit, bumps version
/// - `DELETE /v1/clubs/:club_id/articles/:article_id` - Remove (club admin)

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
    models::{knowledge::KnowledgeArticle, membership::ClubRole},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Article creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 100000, message = "Content must be 1-100000 characters"))]
    pub content: String,
}

/// Article edit request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 100000, message = "Content must be 1-100000 characters"))]
    pub content: Option<String>,
}

/// Lists a club's articles (any member)
pub async fn list_articles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<KnowledgeArticle>>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let articles = KnowledgeArticle::list(&state.db, club_id).await?;

    Ok(Json(articles))
}

/// Creates an article (club admin)
pub async fn create_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
    Json(req): Json<CreateArticleRequest>,
) -> ApiResult<(StatusCode, Json<KnowledgeArticle>)> {
    req.validate().map_err(validation_error)?;

    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let article =
        KnowledgeArticle::create(&state.db, club_id, &req.title, &req.content, auth.user_id)
            .await?;

    Ok((StatusCode::CREATED, Json(article)))
}

/// Returns one article (any member)
pub async fn get_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, article_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<KnowledgeArticle>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let article = KnowledgeArticle::find_by_id(&state.db, club_id, article_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))?;

    Ok(Json(article))
}

/// Edits an article, bumping its version (club admin)
pub async fn update_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, article_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateArticleRequest>,
) -> ApiResult<Json<KnowledgeArticle>> {
    req.validate().map_err(validation_error)?;

    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let article = KnowledgeArticle::update(
        &state.db,
        club_id,
        article_id,
        req.title.as_deref(),
        req.content.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))?;

    Ok(Json(article))
}

/// Deletes an article (club admin)
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((club_id, article_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin).await?;

    let deleted = KnowledgeArticle::delete(&state.db, club_id, article_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Article not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
