/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /api/tasks` - Visible tasks + status summary, optional `?status=`
/// - `POST   /api/tasks` - Create task
/// - `GET    /api/tasks/dashboard` - Global dashboard counts + recent tasks
/// - `GET    /api/tasks/user-dashboard` - Caller-scoped dashboard
/// - `GET    /api/tasks/:id` - Single task
/// - `PUT    /api/tasks/:id` - Merge update
/// - `DELETE /api/tasks/:id` - Delete task
/// - `PUT    /api/tasks/:id/todo/:todo_id` - Toggle a checklist item
///
/// Visibility is decided once per request: admins operate on the whole
/// store, members on tasks they are assigned to. The same scope feeds the
/// listing, its status summary, and the dashboards, so every count a caller
/// sees covers exactly the tasks they can list.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use taskflow_shared::{
    auth::middleware::AuthContext,
    models::task::{
        normalize_checklist, ChecklistItemInput, CreateTask, DashboardCounts, StatusSummary,
        Task, TaskPriority, TaskScope, TaskStatus, UpdateTask,
    },
    models::user::{User, UserView},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
///
/// `createdBy` is never read from the payload; it is bound to the
/// authenticated caller.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub assigned_to: Vec<Uuid>,

    #[serde(default)]
    pub attachments: Vec<String>,

    #[serde(default)]
    pub todo_checklist: Vec<ChecklistItemInput>,
}

/// Merge-update request; absent fields leave the stored value untouched
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    /// Absent = keep, null = clear, value = set
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub assigned_to: Option<Vec<Uuid>>,

    pub attachments: Option<Vec<String>>,

    pub todo_checklist: Option<Vec<ChecklistItemInput>>,
}

/// Distinguishes a field set to null from a field that is absent
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Listing filter
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Optional status filter
    pub status: Option<TaskStatus>,
}

/// Checklist toggle request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleChecklistRequest {
    pub completed: bool,
}

/// Task as returned by read endpoints
///
/// The stored document plus two read-time projections: the completed
/// checklist item count and the resolved assignee profiles.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    pub completed_todo_count: usize,

    pub assignees: Vec<UserView>,
}

/// Listing response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
    pub status_summary: StatusSummary,
}

/// Dashboard response (global or caller-scoped)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub counts: DashboardCounts,

    pub recent_tasks: Vec<TaskView>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    pub message: String,
}

/// Visibility scope for the caller
fn scope_for(ctx: &AuthContext) -> TaskScope {
    if ctx.is_admin() {
        TaskScope::All
    } else {
        TaskScope::AssignedTo(ctx.user_id)
    }
}

/// Resolves assignee profiles for a batch of tasks in one query
async fn task_views(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskView>, sqlx::Error> {
    let mut ids: Vec<Uuid> = tasks
        .iter()
        .flat_map(|task| task.assigned_to.iter().copied())
        .collect();
    ids.sort();
    ids.dedup();

    let users = User::find_many(pool, &ids).await?;
    let by_id: HashMap<Uuid, UserView> = users
        .iter()
        .map(|user| (user.id, UserView::from(user)))
        .collect();

    let views = tasks
        .into_iter()
        .map(|task| {
            let assignees = task
                .assigned_to
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect();
            let completed_todo_count = task.completed_todo_count();

            TaskView {
                task,
                completed_todo_count,
                assignees,
            }
        })
        .collect();

    Ok(views)
}

async fn task_view(pool: &PgPool, task: Task) -> Result<TaskView, sqlx::Error> {
    let mut views = task_views(pool, vec![task]).await?;
    Ok(views.remove(0))
}

/// Checks the write-time referential constraint on assignees
async fn check_assignees(pool: &PgPool, ids: &[Uuid]) -> ApiResult<()> {
    if !User::all_exist(pool, ids).await? {
        return Err(ApiError::BadRequest(
            "One or more assigned users do not exist".to_string(),
        ));
    }
    Ok(())
}

/// List visible tasks with a matching status summary
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks?status=in-progress
/// Authorization: Bearer <token>
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let scope = scope_for(&ctx);

    let tasks = Task::list(&state.db, scope, query.status).await?;
    let status_summary = Task::status_summary(&state.db, scope).await?;

    let tasks = task_views(&state.db, tasks).await?;

    Ok(Json(TaskListResponse {
        tasks,
        status_summary,
    }))
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "title": "Ship release",
///   "description": "Cut and publish v2",
///   "priority": "high",
///   "assignedTo": ["<user-id>"],
///   "todoChecklist": [{"text": "tag commit"}, {"text": "publish"}]
/// }
/// ```
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    req.validate()?;

    check_assignees(&state.db, &req.assigned_to).await?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            due_date: req.due_date,
            created_by: ctx.user_id,
            assigned_to: req.assigned_to,
            attachments: req.attachments,
            todo_checklist: normalize_checklist(req.todo_checklist),
        },
    )
    .await?;

    let view = task_view(&state.db, task).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Single task by id
pub async fn get_task(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let view = task_view(&state.db, task).await?;

    Ok(Json(view))
}

/// Merge-update a task
///
/// Fields present in the body overwrite the stored value; fields absent are
/// preserved. An update that replaces the checklist recomputes progress in
/// the same statement.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    req.validate()?;

    if let Some(ref assigned_to) = req.assigned_to {
        check_assignees(&state.db, assigned_to).await?;
    }

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            priority: req.priority,
            status: req.status,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
            attachments: req.attachments,
            todo_checklist: req.todo_checklist.map(normalize_checklist),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let view = task_view(&state.db, task).await?;

    Ok(Json(view))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(DeleteTaskResponse {
        message: "Task removed".to_string(),
    }))
}

/// Toggle a checklist item
///
/// Sets the item's completion flag and recomputes the task's progress in
/// one atomic write; returns the full updated task.
///
/// # Endpoint
///
/// ```text
/// PUT /api/tasks/:id/todo/:todo_id
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "completed": true }
/// ```
pub async fn update_task_checklist(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    Path((id, todo_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ToggleChecklistRequest>,
) -> ApiResult<Json<TaskView>> {
    let task = Task::set_checklist_item(&state.db, id, todo_id, req.completed).await?;

    let view = task_view(&state.db, task).await?;

    Ok(Json(view))
}

/// Global dashboard: store-wide counts, due-today count, 5 most recent tasks
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    dashboard_for_scope(&state, TaskScope::All).await
}

/// Caller-scoped dashboard: same shape, restricted to the caller's
/// assignments
pub async fn user_dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    dashboard_for_scope(&state, TaskScope::AssignedTo(ctx.user_id)).await
}

async fn dashboard_for_scope(
    state: &AppState,
    scope: TaskScope,
) -> ApiResult<Json<DashboardResponse>> {
    let counts = Task::dashboard_counts(&state.db, scope).await?;
    let recent = Task::recent(&state.db, scope, 5).await?;
    let recent_tasks = task_views(&state.db, recent).await?;

    Ok(Json(DashboardResponse {
        counts,
        recent_tasks,
    }))
}
