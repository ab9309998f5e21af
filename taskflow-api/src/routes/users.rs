/// User management endpoints
///
/// # Endpoints
///
/// - `GET    /api/user` - List users with task-count annotations (admin)
/// - `GET    /api/user/:id` - Single user (any authenticated caller)
/// - `DELETE /api/user/:id` - Delete user (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use taskflow_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::user::{User, UserRole, UserView, UserWithTaskCounts},
};
use uuid::Uuid;

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub message: String,
}

/// List all users, each annotated with pending/in-progress/completed task
/// counts over their assignments
pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserWithTaskCounts>>> {
    require_role(&ctx, UserRole::Admin)?;

    let users = User::list_with_task_counts(&state.db).await?;

    Ok(Json(users))
}

/// Single user by id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserView>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserView::from(&user)))
}

/// Delete a user
///
/// Also removes the user from every task's assignee list; `created_by`
/// references become NULL via the foreign key.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteUserResponse>> {
    require_role(&ctx, UserRole::Admin)?;

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(DeleteUserResponse {
        message: "User removed".to_string(),
    }))
}
