/// Top-level task endpoints (personal and club-scoped)
///
/// Progress and status stay coupled on every write: the model merges the
/// requested changes and reconciles the pair before persisting.
///
/// # Endpoints
///
/// - `GET /v1/tasks` - Own and assigned tasks
/// - `POST /v1/tasks` - Create personal or club task
/// - `GET /v1/tasks/:task_id` - Detail with assignees
/// - `PUT /v1/tasks/:task_id` - Update fields, progress, status
/// - `DELETE /v1/tasks/:task_id` - Delete
/// - `PUT /v1/tasks/:task_id/assignees` - Replace assignee set
/// - `GET /v1/clubs/:club_id/tasks` - Club task listing

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
        authorization::{require_club_membership, require_club_role, require_ownership},
        middleware::AuthContext,
    },
    models::{
        membership::ClubRole,
        task::{CreateTask, Task, TaskKind, TaskPriority, TaskStatus, UpdateTask},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,

    /// Present makes this a club task; absent, a personal one
    pub club_id: Option<Uuid>,
}

/// Task update request; omitted fields stay unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description too long"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,

    #[validate(range(min = 0, max = 100, message = "Progress must be 0-100"))]
    pub progress: Option<i32>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Assignee replacement request
#[derive(Debug, Deserialize)]
pub struct SetAssigneesRequest {
    pub assignees: Vec<Uuid>,
}

/// Task detail with assignees
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub assignees: Vec<Uuid>,
}

/// Checks the user may see a task: creator, assignee, or fellow club member
async fn require_task_access(
    state: &AppState,
    auth: &AuthContext,
    task: &Task,
) -> Result<(), ApiError> {
    if task.created_by == auth.user_id || auth.is_site_admin() {
        return Ok(());
    }

    if Task::assignees(&state.db, task.id)
        .await?
        .contains(&auth.user_id)
    {
        return Ok(());
    }

    match task.club_id {
        Some(club_id) => {
            require_club_membership(&state.db, club_id, auth.user_id)
                .await
                .map_err(|_| ApiError::NotFound("Task not found".to_string()))?;
            Ok(())
        }
        None => Err(ApiError::NotFound("Task not found".to_string())),
    }
}

/// Checks the user may mutate a task: creator, assignee, or club admin
async fn require_task_write(
    state: &AppState,
    auth: &AuthContext,
    task: &Task,
) -> Result<(), ApiError> {
    if task.created_by == auth.user_id || auth.is_site_admin() {
        return Ok(());
    }

    if Task::assignees(&state.db, task.id)
        .await?
        .contains(&auth.user_id)
    {
        return Ok(());
    }

    match task.club_id {
        Some(club_id) => {
            require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin)
                .await
                .map_err(|_| ApiError::NotFound("Task not found".to_string()))?;
            Ok(())
        }
        None => Err(ApiError::NotFound("Task not found".to_string())),
    }
}

/// Lists the user's own and assigned tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(tasks))
}

/// Lists a club's tasks (any member)
pub async fn list_club_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(club_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    require_club_membership(&state.db, club_id, auth.user_id).await?;

    let tasks = Task::list_by_club(&state.db, club_id).await?;

    Ok(Json(tasks))
}

/// Creates a task
///
/// A `club_id` makes the task club-scoped and requires membership in that
/// club; without one the task is personal.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_error)?;

    let kind = match req.club_id {
        Some(club_id) => {
            require_club_membership(&state.db, club_id, auth.user_id).await?;
            TaskKind::Club
        }
        None => TaskKind::Personal,
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            kind,
            title: req.title,
            description: req.description.unwrap_or_default(),
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            due_date: req.due_date,
            club_id: req.club_id,
            created_by: auth.user_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Returns a task with its assignees
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_task_access(&state, &auth, &task).await?;

    let assignees = Task::assignees(&state.db, task.id).await?;

    Ok(Json(TaskDetail { task, assignees }))
}

/// Updates a task; progress and status are reconciled after the merge
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(validation_error)?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_task_write(&state, &auth, &task).await?;

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
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

    Ok(Json(task))
}

/// Deletes a task (creator, club admin, or site admin)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if task.created_by != auth.user_id && !auth.is_site_admin() {
        match task.club_id {
            Some(club_id) => {
                require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin)
                    .await
                    .map_err(|_| ApiError::NotFound("Task not found".to_string()))?;
            }
            None => require_ownership(&auth, task.created_by)?,
        }
    }

    Task::delete(&state.db, task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces a task's assignee set (creator or club admin)
///
/// Club tasks may only be assigned to members of the club.
pub async fn set_assignees(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<SetAssigneesRequest>,
) -> ApiResult<Json<TaskDetail>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if task.created_by != auth.user_id && !auth.is_site_admin() {
        match task.club_id {
            Some(club_id) => {
                require_club_role(&state.db, club_id, auth.user_id, ClubRole::Admin)
                    .await
                    .map_err(|_| ApiError::NotFound("Task not found".to_string()))?;
            }
            None => require_ownership(&auth, task.created_by)?,
        }
    }

    if let Some(club_id) = task.club_id {
        for user_id in &req.assignees {
            require_club_membership(&state.db, club_id, *user_id)
                .await
                .map_err(|_| {
                    ApiError::BadRequest(format!("User {user_id} is not a member of the club"))
                })?;
        }
    }

    Task::set_assignees(&state.db, task_id, &req.assignees).await?;

    let assignees = Task::assignees(&state.db, task_id).await?;

    Ok(Json(TaskDetail { task, assignees }))
}
