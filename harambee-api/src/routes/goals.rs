/// Planning hierarchy endpoints: goals, objectives, key results
///
/// Displayed goal progress is derived at read time from children;
/// objective progress is persisted only by key-result writes. Every
/// mutation lands in the activity log with its changed fields.
///
/// # Endpoints
///
/// - `GET|POST /v1/goals` - List (own or per club) and create
/// - `GET|PUT|DELETE /v1/goals/:goal_id`
/// - `GET|POST /v1/goals/:goal_id/objectives`
/// - `GET /v1/goals/:goal_id/activity`
/// - `GET|PUT|DELETE /v1/objectives/:objective_id`
/// - `GET|POST /v1/objectives/:objective_id/key-results`
/// - `PUT|DELETE /v1/objectives/:objective_id/key-results/:key_result_id`

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use harambee_shared::{
    auth::{
        authorization::{require_club_membership, require_club_role},
        middleware::AuthContext,
    },
    models::{
        activity_log::{ActivityContext, ActivityLog, FieldChange},
        goal::{CreateGoal, Goal, GoalFormat, GoalStatus, UpdateGoal},
        membership::ClubRole,
        objective::{KeyResult, KeyResultStatus, Objective, ObjectiveStatus},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Goal creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGoalRequest {
    pub club_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub format: Option<GoalFormat>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Goal update request; omitted fields stay unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGoalRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub status: Option<GoalStatus>,

    #[validate(range(min = 0, max = 100, message = "Progress must be 0-100"))]
    pub progress: Option<i32>,

    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Goal listing filter
#[derive(Debug, Deserialize)]
pub struct ListGoalsQuery {
    /// With a club, list that club's goals; without, the caller's own
    pub club_id: Option<Uuid>,
}

/// Objective creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateObjectiveRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Success criteria too long"))]
    pub success_criteria: Option<String>,
}

/// Objective update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateObjectiveRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Success criteria too long"))]
    pub success_criteria: Option<String>,

    pub status: Option<ObjectiveStatus>,
}

/// Key result creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateKeyResultRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub target_value: f64,

    #[validate(length(max = 50, message = "Unit too long"))]
    pub unit: Option<String>,

    pub due_date: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
}

/// Key result update request
#[derive(Debug, Deserialize)]
pub struct UpdateKeyResultRequest {
    pub current_value: Option<f64>,
    pub status: Option<KeyResultStatus>,
}

/// Goal with its read-time derived progress
#[derive(Debug, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub derived_progress: i32,
}

/// Objective with its read-time derived progress
#[derive(Debug, Serialize)]
pub struct ObjectiveView {
    #[serde(flatten)]
    pub objective: Objective,
    pub derived_progress: i32,
}

async fn goal_view(state: &AppState, goal: Goal) -> Result<GoalView, ApiError> {
    let derived_progress = goal.derived_progress(&state.db).await?;
    Ok(GoalView {
        goal,
        derived_progress,
    })
}

async fn objective_view(state: &AppState, objective: Objective) -> Result<ObjectiveView, ApiError> {
    let derived_progress = objective.derived_progress(&state.db).await?;
    Ok(ObjectiveView {
        objective,
        derived_progress,
    })
}

/// Loads a goal and checks the caller may read it (club member)
async fn load_readable_goal(
    state: &AppState,
    auth: &AuthContext,
    goal_id: Uuid,
) -> Result<Goal, ApiError> {
    let goal = Goal::find_by_id(&state.db, goal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Goal not found".to_string()))?;

    if goal.owner_id != auth.user_id && !auth.is_site_admin() {
        require_club_membership(&state.db, goal.club_id, auth.user_id)
            .await
            .map_err(|_| ApiError::NotFound("Goal not found".to_string()))?;
    }

    Ok(goal)
}

/// Loads a goal and checks the caller may mutate it (owner or club admin)
async fn load_writable_goal(
    state: &AppState,
    auth: &AuthContext,
    goal_id: Uuid,
) -> Result<Goal, ApiError> {
    let goal = Goal::find_by_id(&state.db, goal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Goal not found".to_string()))?;

    if goal.owner_id != auth.user_id && !auth.is_site_admin() {
        require_club_role(&state.db, goal.club_id, auth.user_id, ClubRole::Admin)
            .await
            .map_err(|_| ApiError::NotFound("Goal not found".to_string()))?;
    }

    Ok(goal)
}

/// Resolves an objective together with its writable goal
async fn load_writable_objective(
    state: &AppState,
    auth: &AuthContext,
    objective_id: Uuid,
) -> Result<(Objective, Goal), ApiError> {
    let objective = Objective::find_by_id(&state.db, objective_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Objective not found".to_string()))?;

    let goal = load_writable_goal(state, auth, objective.goal_id).await?;

    Ok((objective, goal))
}

async fn record_activity(
    state: &AppState,
    auth: &AuthContext,
    category: &str,
    verb: &str,
    object: &str,
    entity_type: &str,
    entity_id: Uuid,
    context: ActivityContext,
    changes: &[FieldChange],
) {
    if let Err(e) = ActivityLog::record(
        &state.db,
        Some(auth.user_id),
        category,
        verb,
        object,
        entity_type,
        entity_id,
        context,
        changes,
    )
    .await
    {
        tracing::warn!(entity_id = %entity_id, error = %e, "failed to record activity");
    }
}

fn goal_context(goal: &Goal) -> ActivityContext {
    ActivityContext {
        club_id: Some(goal.club_id),
        goal_id: Some(goal.id),
        ..Default::default()
    }
}

/// Lists goals: a club's goals (member) or the caller's own
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListGoalsQuery>,
) -> ApiResult<Json<Vec<GoalView>>> {
    let goals = match query.club_id {
        Some(club_id) => {
            require_club_membership(&state.db, club_id, auth.user_id).await?;
            Goal::list_by_club(&state.db, club_id).await?
        }
        None => Goal::list_by_owner(&state.db, auth.user_id).await?,
    };

    let mut views = Vec::with_capacity(goals.len());
    for goal in goals {
        views.push(goal_view(&state, goal).await?);
    }

    Ok(Json(views))
}

/// Creates a goal (any member of the club)
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateGoalRequest>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    req.validate().map_err(validation_error)?;

    require_club_membership(&state.db, req.club_id, auth.user_id).await?;

    let goal = Goal::create(
        &state.db,
        CreateGoal {
            club_id: req.club_id,
            owner_id: auth.user_id,
            title: req.title,
            description: req.description.unwrap_or_default(),
            format: req.format.unwrap_or(GoalFormat::Okr),
            start_date: req.start_date,
            due_date: req.due_date,
        },
    )
    .await?;

    record_activity(
        &state,
        &auth,
        "goal",
        "created",
        &goal.title,
        "goal",
        goal.id,
        goal_context(&goal),
        &[],
    )
    .await;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// Returns a goal with derived progress
pub async fn get_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<Json<GoalView>> {
    let goal = load_readable_goal(&state, &auth, goal_id).await?;

    Ok(Json(goal_view(&state, goal).await?))
}

/// Updates a goal (owner or club admin)
pub async fn update_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<UpdateGoalRequest>,
) -> ApiResult<Json<GoalView>> {
    req.validate().map_err(validation_error)?;

    let before = load_writable_goal(&state, &auth, goal_id).await?;

    let goal = Goal::update(
        &state.db,
        goal_id,
        UpdateGoal {
            title: req.title,
            description: req.description,
            status: req.status,
            progress: req.progress,
            start_date: req.start_date,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Goal not found".to_string()))?;

    let mut changes = Vec::new();
    if before.status != goal.status {
        changes.push(FieldChange {
            field: "status".to_string(),
            old: serde_json::json!(before.status.as_str()),
            new: serde_json::json!(goal.status.as_str()),
        });
    }
    if before.progress != goal.progress {
        changes.push(FieldChange {
            field: "progress".to_string(),
            old: serde_json::json!(before.progress),
            new: serde_json::json!(goal.progress),
        });
    }

    record_activity(
        &state,
        &auth,
        "goal",
        "updated",
        &goal.title,
        "goal",
        goal.id,
        goal_context(&goal),
        &changes,
    )
    .await;

    Ok(Json(goal_view(&state, goal).await?))
}

/// Deletes a goal and everything under it (owner or club admin)
pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let goal = load_writable_goal(&state, &auth, goal_id).await?;

    Goal::delete(&state.db, goal.id).await?;

    record_activity(
        &state,
        &auth,
        "goal",
        "deleted",
        &goal.title,
        "goal",
        goal.id,
        ActivityContext {
            club_id: Some(goal.club_id),
            ..Default::default()
        },
        &[],
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a goal's objectives with derived progress
pub async fn list_objectives(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ObjectiveView>>> {
    load_readable_goal(&state, &auth, goal_id).await?;

    let objectives = Objective::list_by_goal(&state.db, goal_id).await?;

    let mut views = Vec::with_capacity(objectives.len());
    for objective in objectives {
        views.push(objective_view(&state, objective).await?);
    }

    Ok(Json(views))
}

/// Adds an objective under a goal (owner or club admin)
pub async fn create_objective(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
    Json(req): Json<CreateObjectiveRequest>,
) -> ApiResult<(StatusCode, Json<Objective>)> {
    req.validate().map_err(validation_error)?;

    let goal = load_writable_goal(&state, &auth, goal_id).await?;

    let objective = Objective::create(
        &state.db,
        goal_id,
        &req.title,
        req.success_criteria.as_deref().unwrap_or(""),
    )
    .await?;

    record_activity(
        &state,
        &auth,
        "objective",
        "created",
        &objective.title,
        "objective",
        objective.id,
        ActivityContext {
            club_id: Some(goal.club_id),
            goal_id: Some(goal.id),
            objective_id: Some(objective.id),
            ..Default::default()
        },
        &[],
    )
    .await;

    Ok((StatusCode::CREATED, Json(objective)))
}

/// Lists a goal's activity, newest first
pub async fn list_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(goal_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    load_readable_goal(&state, &auth, goal_id).await?;

    let entries = ActivityLog::list_by_goal(&state.db, goal_id, 100).await?;

    Ok(Json(entries))
}

/// Returns an objective with derived progress
pub async fn get_objective(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(objective_id): Path<Uuid>,
) -> ApiResult<Json<ObjectiveView>> {
    let objective = Objective::find_by_id(&state.db, objective_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Objective not found".to_string()))?;

    load_readable_goal(&state, &auth, objective.goal_id).await?;

    Ok(Json(objective_view(&state, objective).await?))
}

/// Updates an objective (goal owner or club admin)
pub async fn update_objective(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(objective_id): Path<Uuid>,
    Json(req): Json<UpdateObjectiveRequest>,
) -> ApiResult<Json<ObjectiveView>> {
    req.validate().map_err(validation_error)?;

    let (before, goal) = load_writable_objective(&state, &auth, objective_id).await?;

    let objective = Objective::update(
        &state.db,
        objective_id,
        req.title.as_deref(),
        req.success_criteria.as_deref(),
        req.status,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Objective not found".to_string()))?;

    let mut changes = Vec::new();
    if before.status != objective.status {
        changes.push(FieldChange {
            field: "status".to_string(),
            old: serde_json::json!(before.status),
            new: serde_json::json!(objective.status),
        });
    }

    record_activity(
        &state,
        &auth,
        "objective",
        "updated",
        &objective.title,
        "objective",
        objective.id,
        ActivityContext {
            club_id: Some(goal.club_id),
            goal_id: Some(goal.id),
            objective_id: Some(objective.id),
            ..Default::default()
        },
        &changes,
    )
    .await;

    Ok(Json(objective_view(&state, objective).await?))
}

/// Deletes an objective and its key results (goal owner or club admin)
pub async fn delete_objective(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(objective_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let (objective, goal) = load_writable_objective(&state, &auth, objective_id).await?;

    Objective::delete(&state.db, objective.id).await?;

    record_activity(
        &state,
        &auth,
        "objective",
        "deleted",
        &objective.title,
        "objective",
        objective.id,
        ActivityContext {
            club_id: Some(goal.club_id),
            goal_id: Some(goal.id),
            ..Default::default()
        },
        &[],
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists an objective's key results
pub async fn list_key_results(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(objective_id): Path<Uuid>,
) -> ApiResult<Json<Vec<KeyResult>>> {
    let objective = Objective::find_by_id(&state.db, objective_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Objective not found".to_string()))?;

    load_readable_goal(&state, &auth, objective.goal_id).await?;

    let key_results = KeyResult::list_by_objective(&state.db, objective_id).await?;

    Ok(Json(key_results))
}

/// Adds a key result; the objective's progress is recomputed in the same
/// transaction
pub async fn create_key_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(objective_id): Path<Uuid>,
    Json(req): Json<CreateKeyResultRequest>,
) -> ApiResult<(StatusCode, Json<KeyResult>)> {
    req.validate().map_err(validation_error)?;

    if req.target_value <= 0.0 {
        return Err(ApiError::BadRequest(
            "Target value must be positive".to_string(),
        ));
    }

    let (objective, goal) = load_writable_objective(&state, &auth, objective_id).await?;

    let key_result = KeyResult::create(
        &state.db,
        objective_id,
        &req.title,
        req.target_value,
        req.unit.as_deref().unwrap_or(""),
        req.due_date,
        req.owner_id,
    )
    .await?;

    record_activity(
        &state,
        &auth,
        "key_result",
        "created",
        &key_result.title,
        "key_result",
        key_result.id,
        ActivityContext {
            club_id: Some(goal.club_id),
            goal_id: Some(goal.id),
            objective_id: Some(objective.id),
            ..Default::default()
        },
        &[],
    )
    .await;

    Ok((StatusCode::CREATED, Json(key_result)))
}

/// Updates a key result's value/status; objective progress follows in the
/// same transaction
pub async fn update_key_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((objective_id, key_result_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateKeyResultRequest>,
) -> ApiResult<Json<KeyResult>> {
    let (objective, goal) = load_writable_objective(&state, &auth, objective_id).await?;

    let before = KeyResult::list_by_objective(&state.db, objective_id)
        .await?
        .into_iter()
        .find(|kr| kr.id == key_result_id)
        .ok_or_else(|| ApiError::NotFound("Key result not found".to_string()))?;

    let key_result = KeyResult::update(&state.db, key_result_id, req.current_value, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Key result not found".to_string()))?;

    let mut changes = Vec::new();
    if (before.current_value - key_result.current_value).abs() > f64::EPSILON {
        changes.push(FieldChange {
            field: "current_value".to_string(),
            old: serde_json::json!(before.current_value),
            new: serde_json::json!(key_result.current_value),
        });
    }
    if before.status != key_result.status {
        changes.push(FieldChange {
            field: "status".to_string(),
            old: serde_json::json!(before.status),
            new: serde_json::json!(key_result.status),
        });
    }

    record_activity(
        &state,
        &auth,
        "key_result",
        "updated",
        &key_result.title,
        "key_result",
        key_result.id,
        ActivityContext {
            club_id: Some(goal.club_id),
            goal_id: Some(goal.id),
            objective_id: Some(objective.id),
            ..Default::default()
        },
        &changes,
    )
    .await;

    Ok(Json(key_result))
}

/// Removes a key result; objective progress follows in the same
/// transaction
pub async fn delete_key_result(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((objective_id, key_result_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let (objective, goal) = load_writable_objective(&state, &auth, objective_id).await?;

    let exists = KeyResult::list_by_objective(&state.db, objective_id)
        .await?
        .iter()
        .any(|kr| kr.id == key_result_id);
    if !exists {
        return Err(ApiError::NotFound("Key result not found".to_string()));
    }

    KeyResult::delete(&state.db, key_result_id).await?;

    record_activity(
        &state,
        &auth,
        "key_result",
        "deleted",
        "key result",
        "key_result",
        key_result_id,
        ActivityContext {
            club_id: Some(goal.club_id),
            goal_id: Some(goal.id),
            objective_id: Some(objective.id),
            ..Default::default()
        },
        &[],
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
