/// Task model and database operations
///
/// Tasks are the central entity: a titled, prioritized unit of work with an
/// embedded checklist, an assignee list, and a derived `progress` percent.
///
/// # Progress invariant
///
/// `progress` is always `round(100 * completed_items / total_items)` for a
/// non-empty checklist and `0` for an empty one. It is recomputed inside the
/// same statement as any checklist write (the item-level toggle path and
/// the full-document merge path both go through [`progress_percent`]), so a
/// reader can never observe a checklist and a progress value that disagree.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'pending',
///     due_date TIMESTAMPTZ,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     assigned_to UUID[] NOT NULL DEFAULT '{}',
///     attachments TEXT[] NOT NULL DEFAULT '{}',
///     todo_checklist JSONB NOT NULL DEFAULT '[]',
///     progress INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Checklist items live inside the task row as a JSONB array of
/// `{id, text, completed}` objects. They have no lifecycle of their own:
/// created, mutated, and deleted only through task writes.
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::models::task::{CreateTask, Task, TaskPriority};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, me: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(
///     &pool,
///     CreateTask {
///         title: "Ship release".to_string(),
///         description: "Cut and publish v2".to_string(),
///         priority: TaskPriority::High,
///         due_date: None,
///         created_by: me,
///         assigned_to: vec![me],
///         attachments: Vec::new(),
///         todo_checklist: Vec::new(),
///     },
/// )
/// .await?;
/// assert_eq!(task.progress, 0);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Column list shared by every task query
const TASK_COLUMNS: &str = "id, title, description, priority, status, due_date, created_by, \
                            assigned_to, attachments, todo_checklist, progress, \
                            created_at, updated_at";

/// Task lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Converts priority to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// A checklist line embedded in a task
///
/// Ids are assigned server-side when the item first appears and stay stable
/// across edits, so the toggle endpoint can address items individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// Stable per-item id
    pub id: Uuid,

    /// Item text
    pub text: String,

    /// Completion flag
    pub completed: bool,
}

/// Checklist item as submitted by clients
///
/// Existing items arrive with their id; new items arrive without one and get
/// a fresh id during normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemInput {
    pub id: Option<Uuid>,
    pub text: String,

    #[serde(default)]
    pub completed: bool,
}

/// Assigns ids to incoming checklist items where missing
pub fn normalize_checklist(items: Vec<ChecklistItemInput>) -> Vec<ChecklistItem> {
    items
        .into_iter()
        .map(|item| ChecklistItem {
            id: item.id.unwrap_or_else(Uuid::new_v4),
            text: item.text,
            completed: item.completed,
        })
        .collect()
}

/// Derived progress over a checklist
///
/// Rounded percentage of completed items; an empty checklist is 0.
pub fn progress_percent(items: &[ChecklistItem]) -> i32 {
    if items.is_empty() {
        return 0;
    }

    let completed = items.iter().filter(|item| item.completed).count();
    ((completed as f64 / items.len() as f64) * 100.0).round() as i32
}

/// Which tasks a caller may see
///
/// Admins see the whole store; members see tasks they are assigned to. The
/// same scope is threaded into listings, summaries, and dashboards so every
/// number a caller receives covers exactly the tasks they can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Every task in the store
    All,

    /// Only tasks whose assignee list contains the user
    AssignedTo(Uuid),
}

impl TaskScope {
    /// Scope as a nullable bind parameter (`NULL` = unrestricted)
    fn as_param(&self) -> Option<Uuid> {
        match self {
            TaskScope::All => None,
            TaskScope::AssignedTo(user_id) => Some(*user_id),
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Longer description
    pub description: String,

    /// Priority bucket
    pub priority: TaskPriority,

    /// Lifecycle stage
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// User who created the task (NULL once that user is deleted)
    pub created_by: Option<Uuid>,

    /// Ordered assignee list (may be empty)
    pub assigned_to: Vec<Uuid>,

    /// Attachment URLs
    pub attachments: Vec<String>,

    /// Embedded checklist
    pub todo_checklist: Json<Vec<ChecklistItem>>,

    /// Derived completion percent, see module docs
    pub progress: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Number of completed checklist items (read-time projection)
    pub fn completed_todo_count(&self) -> usize {
        self.todo_checklist
            .0
            .iter()
            .filter(|item| item.completed)
            .count()
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,

    /// Always the authenticated caller, never client-supplied
    pub created_by: Uuid,
    pub assigned_to: Vec<Uuid>,
    pub attachments: Vec<String>,
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Input for the merge-update path
///
/// Fields present overwrite the stored value; fields absent are untouched.
/// `due_date` uses a double Option so a client can clear it explicitly.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assigned_to: Option<Vec<Uuid>>,
    pub attachments: Option<Vec<String>>,

    /// Replacing the checklist recomputes `progress` in the same statement
    pub todo_checklist: Option<Vec<ChecklistItem>>,
}

/// Error type for checklist-item updates
///
/// Distinguishes the two 404 cases the toggle endpoint can hit.
#[derive(Debug, thiserror::Error)]
pub enum ChecklistError {
    /// The task id does not resolve
    #[error("Task not found")]
    TaskNotFound,

    /// The task exists but has no checklist item with that id
    #[error("Checklist item not found")]
    ItemNotFound,

    /// Underlying database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Per-scope status counts returned alongside task listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub all: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Scoped counts for the dashboard endpoints
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,

    /// Tasks due within the server-local current calendar day
    pub tasks_due_today: i64,
}

impl Task {
    /// Creates a new task
    ///
    /// Initial `progress` is derived from the supplied checklist, and status
    /// starts at `pending`. Checklist items must already carry ids (see
    /// [`normalize_checklist`]).
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let progress = progress_percent(&data.todo_checklist);

        let query = format!(
            "INSERT INTO tasks (title, description, priority, due_date, created_by, \
             assigned_to, attachments, todo_checklist, progress) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.created_by)
            .bind(data.assigned_to)
            .bind(data.attachments)
            .bind(Json(data.todo_checklist))
            .bind(progress)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists tasks visible in the given scope, newest first
    ///
    /// An optional status filter narrows the listing without affecting the
    /// scope.
    pub async fn list(
        pool: &PgPool,
        scope: TaskScope,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE ($1::uuid IS NULL OR $1 = ANY(assigned_to)) \
               AND ($2::task_status IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(scope.as_param())
            .bind(status)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Status counts over the same visibility scope as [`Task::list`]
    ///
    /// `all` always equals `pending + in_progress + completed` since the
    /// three statuses partition the scope.
    pub async fn status_summary(
        pool: &PgPool,
        scope: TaskScope,
    ) -> Result<StatusSummary, sqlx::Error> {
        let summary = sqlx::query_as::<_, StatusSummary>(
            r#"
            SELECT COUNT(*)                                         AS "all",
                   COUNT(*) FILTER (WHERE status = 'pending')       AS pending,
                   COUNT(*) FILTER (WHERE status = 'in-progress')   AS in_progress,
                   COUNT(*) FILTER (WHERE status = 'completed')     AS completed
            FROM tasks
            WHERE ($1::uuid IS NULL OR $1 = ANY(assigned_to))
            "#,
        )
        .bind(scope.as_param())
        .fetch_one(pool)
        .await?;

        Ok(summary)
    }

    /// Scoped dashboard counts, including tasks due today
    ///
    /// "Today" is the server-local calendar day, midnight to midnight.
    pub async fn dashboard_counts(
        pool: &PgPool,
        scope: TaskScope,
    ) -> Result<DashboardCounts, sqlx::Error> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT COUNT(*)                                       AS total_tasks,
                   COUNT(*) FILTER (WHERE status = 'pending')     AS pending_tasks,
                   COUNT(*) FILTER (WHERE status = 'in-progress') AS in_progress_tasks,
                   COUNT(*) FILTER (WHERE status = 'completed')   AS completed_tasks,
                   COUNT(*) FILTER (
                       WHERE due_date >= date_trunc('day', now())
                         AND due_date <  date_trunc('day', now()) + interval '1 day'
                   )                                              AS tasks_due_today
            FROM tasks
            WHERE ($1::uuid IS NULL OR $1 = ANY(assigned_to))
            "#,
        )
        .bind(scope.as_param())
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }

    /// The most recently created tasks in scope
    pub async fn recent(
        pool: &PgPool,
        scope: TaskScope,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE ($1::uuid IS NULL OR $1 = ANY(assigned_to)) \
             ORDER BY created_at DESC \
             LIMIT $2"
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(scope.as_param())
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Sets one checklist item's completion flag and recomputes progress
    ///
    /// The read-modify-write runs in a single transaction with the task row
    /// locked (`SELECT ... FOR UPDATE`), so concurrent toggles on different
    /// items of the same task serialize instead of losing updates, and the
    /// item flag and recomputed progress land in one UPDATE.
    ///
    /// # Errors
    ///
    /// `ChecklistError::TaskNotFound` if the task id does not resolve,
    /// `ChecklistError::ItemNotFound` if the checklist has no such item.
    pub async fn set_checklist_item(
        pool: &PgPool,
        task_id: Uuid,
        item_id: Uuid,
        completed: bool,
    ) -> Result<Self, ChecklistError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ChecklistError::TaskNotFound)?;

        let mut items = task.todo_checklist.0;
        let item = items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(ChecklistError::ItemNotFound)?;
        item.completed = completed;

        let progress = progress_percent(&items);

        let query = format!(
            "UPDATE tasks SET todo_checklist = $2, progress = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .bind(Json(items))
            .bind(progress)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Merge-updates a task
    ///
    /// Only fields present in `data` are written. When the checklist is
    /// among them, `progress` is recomputed from the incoming items inside
    /// the same UPDATE, so the derived value cannot drift from the checklist
    /// through this path either.
    ///
    /// # Returns
    ///
    /// The updated task, or None if the id does not resolve.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }
        if data.attachments.is_some() {
            bind_count += 1;
            query.push_str(&format!(", attachments = ${}", bind_count));
        }

        let progress = data.todo_checklist.as_ref().map(|items| progress_percent(items));
        if data.todo_checklist.is_some() {
            bind_count += 1;
            query.push_str(&format!(", todo_checklist = ${}", bind_count));
            bind_count += 1;
            query.push_str(&format!(", progress = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(attachments) = data.attachments {
            q = q.bind(attachments);
        }
        if let Some(items) = data.todo_checklist {
            q = q.bind(Json(items)).bind(progress.unwrap_or(0));
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Hard delete; there is no soft-delete state.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, completed: bool) -> ChecklistItem {
        ChecklistItem {
            id: Uuid::new_v4(),
            text: text.to_string(),
            completed,
        }
    }

    #[test]
    fn test_progress_empty_checklist() {
        assert_eq!(progress_percent(&[]), 0);
    }

    #[test]
    fn test_progress_basic_fractions() {
        let items = vec![item("a", false), item("b", false)];
        assert_eq!(progress_percent(&items), 0);

        let items = vec![item("a", true), item("b", false)];
        assert_eq!(progress_percent(&items), 50);

        let items = vec![item("a", true), item("b", true)];
        assert_eq!(progress_percent(&items), 100);
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        let items = vec![item("a", true), item("b", false), item("c", false)];
        assert_eq!(progress_percent(&items), 33);

        let items = vec![item("a", true), item("b", true), item("c", false)];
        assert_eq!(progress_percent(&items), 67);

        let mut items = vec![item("a", true)];
        items.extend((0..5).map(|_| item("x", false)));
        assert_eq!(progress_percent(&items), 17);
    }

    #[test]
    fn test_toggle_pair_restores_progress() {
        // Flipping the same item twice must land back on the original value
        let mut items = vec![item("a", false), item("b", true)];
        let original = progress_percent(&items);

        items[0].completed = true;
        assert_ne!(progress_percent(&items), original);

        items[0].completed = false;
        assert_eq!(progress_percent(&items), original);
    }

    #[test]
    fn test_normalize_checklist_assigns_missing_ids() {
        let existing = Uuid::new_v4();
        let items = normalize_checklist(vec![
            ChecklistItemInput {
                id: Some(existing),
                text: "keep id".to_string(),
                completed: true,
            },
            ChecklistItemInput {
                id: None,
                text: "new item".to_string(),
                completed: false,
            },
        ]);

        assert_eq!(items[0].id, existing);
        assert!(items[0].completed);
        assert_ne!(items[1].id, existing);
        assert_eq!(items[1].text, "new item");
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(TaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"pending\"").unwrap(),
            TaskStatus::Pending
        );
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(TaskPriority::High.as_str(), "high");
        assert_eq!(serde_json::to_string(&TaskPriority::Low).unwrap(), "\"low\"");
        assert!(serde_json::from_str::<TaskPriority>("\"urgent\"").is_err());
    }

    #[test]
    fn test_scope_param() {
        let user_id = Uuid::new_v4();
        assert_eq!(TaskScope::All.as_param(), None);
        assert_eq!(TaskScope::AssignedTo(user_id).as_param(), Some(user_id));
    }

    #[test]
    fn test_checklist_item_serde_shape() {
        let json = r#"{"id":null,"text":"write docs"}"#;
        let input: ChecklistItemInput = serde_json::from_str(json).unwrap();
        assert!(input.id.is_none());
        assert!(!input.completed);

        let item = ChecklistItem {
            id: Uuid::nil(),
            text: "write docs".to_string(),
            completed: true,
        };
        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["text"], "write docs");
        assert_eq!(out["completed"], true);
    }

    #[test]
    fn test_update_task_default_is_empty() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.status.is_none());
        assert!(update.todo_checklist.is_none());
    }
}
