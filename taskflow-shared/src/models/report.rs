/// Aggregate reports over the task store
///
/// Grouping queries backing the report endpoints: the global status/priority
/// breakdown and the per-user completed-task counts. These are read-only
/// projections; nothing here mutates state.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Global status counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Global priority counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

/// Store-wide dashboard statistics
///
/// Status and priority are two independent partitions of the same task set:
/// every task lands in exactly one bucket of each.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tasks: i64,
    pub status: StatusBreakdown,
    pub priority: PriorityBreakdown,
}

#[derive(Debug, sqlx::FromRow)]
struct DashboardStatsRow {
    total_tasks: i64,
    pending: i64,
    in_progress: i64,
    completed: i64,
    high: i64,
    medium: i64,
    low: i64,
}

impl DashboardStats {
    /// Computes global counts in a single pass over the store
    pub async fn fetch(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, DashboardStatsRow>(
            r#"
            SELECT COUNT(*)                                       AS total_tasks,
                   COUNT(*) FILTER (WHERE status = 'pending')     AS pending,
                   COUNT(*) FILTER (WHERE status = 'in-progress') AS in_progress,
                   COUNT(*) FILTER (WHERE status = 'completed')   AS completed,
                   COUNT(*) FILTER (WHERE priority = 'high')      AS high,
                   COUNT(*) FILTER (WHERE priority = 'medium')    AS medium,
                   COUNT(*) FILTER (WHERE priority = 'low')       AS low
            FROM tasks
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(Self {
            total_tasks: row.total_tasks,
            status: StatusBreakdown {
                pending: row.pending,
                in_progress: row.in_progress,
                completed: row.completed,
            },
            priority: PriorityBreakdown {
                high: row.high,
                medium: row.medium,
                low: row.low,
            },
        })
    }
}

/// Completed-task count for one user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPerformance {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub completed_count: i64,
}

impl UserPerformance {
    /// Completed tasks grouped per assignee
    ///
    /// A completed task with several assignees contributes one count to each
    /// of them: the assignee array is unnested before grouping, matching
    /// how the member-scoped listing treats assignment. Users with no
    /// completed tasks do not appear.
    pub async fn fetch(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserPerformance>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, COUNT(*) AS completed_count
            FROM tasks t
            CROSS JOIN LATERAL UNNEST(t.assigned_to) AS a(user_id)
            JOIN users u ON u.id = a.user_id
            WHERE t.status = 'completed'
            GROUP BY u.id, u.name, u.email
            ORDER BY completed_count DESC, u.name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
