/// Report endpoints
///
/// # Endpoints
///
/// - `GET /api/report/dashboard` - Global status/priority breakdown
/// - `GET /api/report/user-performance` - Completed-count per user (admin)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use taskflow_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::report::{DashboardStats, UserPerformance},
    models::user::UserRole,
};

/// Store-wide task statistics
///
/// Status and priority are independent partitions: every task counts once
/// in each breakdown.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
) -> ApiResult<Json<DashboardStats>> {
    let stats = DashboardStats::fetch(&state.db).await?;

    Ok(Json(stats))
}

/// Completed tasks grouped per assignee
///
/// A completed task with several assignees counts once for each of them.
pub async fn user_performance(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserPerformance>>> {
    require_role(&ctx, UserRole::Admin)?;

    let performance = UserPerformance::fetch(&state.db).await?;

    Ok(Json(performance))
}
