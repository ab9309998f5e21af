/// Database layer for TaskFlow
///
/// This module provides connection pooling and the migration runner.
/// Models live in the `models` module at the crate root.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Database migration runner

pub mod migrations;
pub mod pool;
