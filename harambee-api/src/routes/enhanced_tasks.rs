/// Enhanced task endpoints
///
/// The richer task model used by the planning subsystem: checklist items,
/// comments, time entries, and typed dependencies, with the progress-status
/// coupling enforced on every write. Checklist toggles propagate into task
/// progress monotonically.
///
/// # Endpoints
///
/// - `GET /v1/enhanced-tasks` / `POST /v1/enhanced-tasks`
/// - `GET|PUT|DELETE /v1/enhanced-tasks/:task_id`
/// - `PUT /v1/enhanced-tasks/:task_id/progress`
/// - `GET|POST /v1/enhanced-tasks/:task_id/comments`
/// - `GET|POST /v1/enhanced-tasks/:task_id/time-log`
/// - `POST /v1/enhanced-tasks/:task_id/checklist`
/// - `PUT /v1/enhanced-tasks/:task_id/checklist/:item_id/toggle`
/// - `GET|POST /v1/enhanced-tasks/:task_id/dependencies`
/// - `DELETE /v1/enhanced-tasks/:task_id/dependencies/:depends_on_id`

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
    auth::{authorization::require_ownership, middleware::AuthContext},
    models::{
        activity_log::{ActivityContext, ActivityLog, FieldChange},
        enhanced_task::{
            ChecklistItem, CreateEnhancedTask, DependencyKind, EnhancedTask, EnhancedTaskStatus,
            TaskComment, TaskDependency, TimeEntry, UpdateEnhancedTask,
        },
        task::TaskPriority,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Enhanced task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEnhancedTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub priority: Option<TaskPriority>,
    pub goal_id: Option<Uuid>,
    pub objective_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub club_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Enhanced task update request; omitted fields stay unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEnhancedTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub status: Option<EnhancedTaskStatus>,
    pub priority: Option<TaskPriority>,

    #[validate(range(min = 0, max = 100, message = "Progress must be 0-100"))]
    pub progress: Option<i32>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Progress-only update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProgressRequest {
    #[validate(range(min = 0, max = 100, message = "Progress must be 0-100"))]
    pub progress: i32,
}

/// Comment creation request
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"))]
    pub content: String,
}

/// Time log request
#[derive(Debug, Deserialize, Validate)]
pub struct LogTimeRequest {
    #[validate(range(min = 1, max = 1440, message = "Minutes must be 1-1440"))]
    pub minutes: i32,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,
}

/// Checklist item creation request
#[derive(Debug, Deserialize, Validate)]
pub struct AddChecklistItemRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
}

/// Dependency creation request
#[derive(Debug, Deserialize)]
pub struct AddDependencyRequest {
    pub depends_on_id: Uuid,
    pub kind: Option<DependencyKind>,
}

/// Task detail with checklist and logged time
#[derive(Debug, Serialize)]
pub struct EnhancedTaskDetail {
    #[serde(flatten)]
    pub task: EnhancedTask,
    pub checklist: Vec<ChecklistItem>,
    pub total_minutes: i64,
}

/// Result of a checklist toggle: the task plus the checklist percentage
#[derive(Debug, Serialize)]
pub struct ToggleResult {
    #[serde(flatten)]
    pub task: EnhancedTask,
    pub checklist_progress: i32,
}

fn activity_context(task: &EnhancedTask) -> ActivityContext {
    ActivityContext {
        club_id: task.club_id,
        goal_id: task.goal_id,
        objective_id: task.objective_id,
        task_id: Some(task.id),
    }
}

async fn record_activity(
    state: &AppState,
    auth: &AuthContext,
    task: &EnhancedTask,
    verb: &str,
    changes: &[FieldChange],
) {
    if let Err(e) = ActivityLog::record(
        &state.db,
        Some(auth.user_id),
        "task",
        verb,
        &task.title,
        "enhanced_task",
        task.id,
        activity_context(task),
        changes,
    )
    .await
    {
        tracing::warn!(task_id = %task.id, error = %e, "failed to record activity");
    }
}

/// Loads a task and checks the caller may touch it
async fn load_owned(
    state: &AppState,
    auth: &AuthContext,
    task_id: Uuid,
) -> Result<EnhancedTask, ApiError> {
    let task = EnhancedTask::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_ownership(auth, task.created_by)?;

    Ok(task)
}

/// Lists the user's enhanced tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<EnhancedTask>>> {
    let tasks = EnhancedTask::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(tasks))
}

/// Creates an enhanced task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEnhancedTaskRequest>,
) -> ApiResult<(StatusCode, Json<EnhancedTask>)> {
    req.validate().map_err(validation_error)?;

    let task = EnhancedTask::create(
        &state.db,
        CreateEnhancedTask {
            title: req.title,
            description: req.description.unwrap_or_default(),
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            goal_id: req.goal_id,
            objective_id: req.objective_id,
            parent_id: req.parent_id,
            club_id: req.club_id,
            due_date: req.due_date,
            created_by: auth.user_id,
        },
    )
    .await?;

    record_activity(&state, &auth, &task, "created", &[]).await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Returns a task with its checklist and total logged time
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<EnhancedTaskDetail>> {
    let task = load_owned(&state, &auth, task_id).await?;

    let checklist = ChecklistItem::list(&state.db, task.id).await?;
    let total_minutes = TimeEntry::total_minutes(&state.db, task.id).await?;

    Ok(Json(EnhancedTaskDetail {
        task,
        checklist,
        total_minutes,
    }))
}

/// Updates a task; progress and status are reconciled after the merge
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateEnhancedTaskRequest>,
) -> ApiResult<Json<EnhancedTask>> {
    req.validate().map_err(validation_error)?;

    let before = load_owned(&state, &auth, task_id).await?;

    let task = EnhancedTask::update(
        &state.db,
        task_id,
        UpdateEnhancedTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            progress: req.progress,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let mut changes = Vec::new();
    if before.status != task.status {
        changes.push(FieldChange {
            field: "status".to_string(),
            old: serde_json::json!(before.status.as_str()),
            new: serde_json::json!(task.status.as_str()),
        });
    }
    if before.progress != task.progress {
        changes.push(FieldChange {
            field: "progress".to_string(),
            old: serde_json::json!(before.progress),
            new: serde_json::json!(task.progress),
        });
    }

    record_activity(&state, &auth, &task, "updated", &changes).await;

    Ok(Json(task))
}

/// Deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = load_owned(&state, &auth, task_id).await?;

    EnhancedTask::delete(&state.db, task.id).await?;

    record_activity(&state, &auth, &task, "deleted", &[]).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Sets progress; status follows the coupling
pub async fn update_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> ApiResult<Json<EnhancedTask>> {
    req.validate().map_err(validation_error)?;

    let before = load_owned(&state, &auth, task_id).await?;

    let task = EnhancedTask::update(
        &state.db,
        task_id,
        UpdateEnhancedTask {
            progress: Some(req.progress),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    record_activity(
        &state,
        &auth,
        &task,
        "progressed",
        &[FieldChange {
            field: "progress".to_string(),
            old: serde_json::json!(before.progress),
            new: serde_json::json!(task.progress),
        }],
    )
    .await;

    Ok(Json(task))
}

/// Lists a task's comments
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskComment>>> {
    load_owned(&state, &auth, task_id).await?;

    let comments = TaskComment::list(&state.db, task_id).await?;

    Ok(Json(comments))
}

/// Adds a comment
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<TaskComment>)> {
    req.validate().map_err(validation_error)?;

    load_owned(&state, &auth, task_id).await?;

    let comment = TaskComment::add(&state.db, task_id, auth.user_id, &req.content).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Lists a task's time entries
pub async fn list_time_entries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TimeEntry>>> {
    load_owned(&state, &auth, task_id).await?;

    let entries = TimeEntry::list(&state.db, task_id).await?;

    Ok(Json(entries))
}

/// Logs time against a task
pub async fn log_time(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<LogTimeRequest>,
) -> ApiResult<(StatusCode, Json<TimeEntry>)> {
    req.validate().map_err(validation_error)?;

    load_owned(&state, &auth, task_id).await?;

    let entry = TimeEntry::log(
        &state.db,
        task_id,
        auth.user_id,
        req.minutes,
        req.description.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Appends a checklist item
pub async fn add_checklist_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddChecklistItemRequest>,
) -> ApiResult<(StatusCode, Json<ChecklistItem>)> {
    req.validate().map_err(validation_error)?;

    load_owned(&state, &auth, task_id).await?;

    let item = ChecklistItem::add(&state.db, task_id, &req.title).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Toggles a checklist item and propagates progress
///
/// The recomputed checklist percentage raises task progress but never
/// lowers it; status follows the coupling.
pub async fn toggle_checklist_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ToggleResult>> {
    load_owned(&state, &auth, task_id).await?;

    let (task, checklist_progress) =
        EnhancedTask::toggle_checklist_item(&state.db, task_id, item_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Checklist item not found".to_string()))?;

    record_activity(&state, &auth, &task, "checklist-toggled", &[]).await;

    Ok(Json(ToggleResult {
        task,
        checklist_progress,
    }))
}

/// Lists a task's dependencies
pub async fn list_dependencies(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskDependency>>> {
    load_owned(&state, &auth, task_id).await?;

    let dependencies = TaskDependency::list(&state.db, task_id).await?;

    Ok(Json(dependencies))
}

/// Adds a dependency edge
///
/// # Errors
///
/// - `400 Bad Request`: Duplicate edge, self-dependency, or missing target
pub async fn add_dependency(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddDependencyRequest>,
) -> ApiResult<(StatusCode, Json<TaskDependency>)> {
    load_owned(&state, &auth, task_id).await?;

    let dependency = TaskDependency::add(
        &state.db,
        task_id,
        req.depends_on_id,
        req.kind.unwrap_or(DependencyKind::FinishToStart),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(dependency)))
}

/// Removes a dependency edge
pub async fn remove_dependency(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((task_id, depends_on_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    load_owned(&state, &auth, task_id).await?;

    let removed = TaskDependency::remove(&state.db, task_id, depends_on_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Dependency not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
