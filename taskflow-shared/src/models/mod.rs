/// Database models for TaskFlow
///
/// Each model owns its queries as associated functions taking a `&PgPool`.
///
/// # Models
///
/// - `user`: User accounts, roles, and the admin user listing
/// - `task`: Tasks with embedded checklists, derived progress, scoped
///   listings, and dashboard counts
/// - `report`: Aggregate statistics over the task store

pub mod report;
pub mod task;
pub mod user;
