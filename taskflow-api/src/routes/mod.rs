/// API route handlers
///
/// One module per resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, own-profile management
/// - `users`: Admin user listing and management
/// - `tasks`: Task CRUD, checklist toggling, role-scoped dashboards
/// - `reports`: Aggregate statistics
/// - `uploads`: Profile image upload

pub mod auth;
pub mod health;
pub mod reports;
pub mod tasks;
pub mod uploads;
pub mod users;
