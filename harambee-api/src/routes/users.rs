/// Own-profile endpoints
///
/// # Endpoints
///
/// - `GET /v1/users/me` - Current profile
/// - `PUT /v1/users/me` - Update name/email
/// - `PUT /v1/users/me/password` - Change password (requires current)
/// - `PUT /v1/users/me/preferences` - Merge preference values
/// - `GET /v1/users/me/notifications` - List notifications
/// - `PUT /v1/users/me/notifications/:id/read` - Mark one read

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use harambee_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{Notification, User},
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Returns the authenticated user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates name and/or email
///
/// # Errors
///
/// - `409 Conflict`: Email already taken
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate().map_err(validation_error)?;

    let user = User::update_profile(
        &state.db,
        auth.user_id,
        req.name.as_deref(),
        req.email.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Changes the password after verifying the current one
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: New password too weak
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<JsonValue>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = password::verify_password(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    password::validate_password_strength(&req.new_password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "new_password".to_string(),
            message: e,
        }])
    })?;

    let password_hash = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, auth.user_id, &password_hash).await?;

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

/// Merges submitted preference keys over the stored object
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(preferences): Json<JsonValue>,
) -> ApiResult<Json<User>> {
    if !preferences.is_object() {
        return Err(ApiError::BadRequest(
            "Preferences must be a JSON object".to_string(),
        ));
    }

    let user = User::update_preferences(&state.db, auth.user_id, &preferences)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Lists the user's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = Notification::list_by_user(&state.db, auth.user_id).await?;

    Ok(Json(notifications))
}

/// Marks one of the user's notifications read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JsonValue>> {
    let updated = Notification::mark_read(&state.db, id, auth.user_id).await?;
    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Notification marked read" })))
}
