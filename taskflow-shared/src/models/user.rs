/// User model and database operations
///
/// Users carry their role directly (`admin` or `member`); there is no
/// separate membership table. Passwords are stored as Argon2id hashes and
/// are excluded from every API response via the [`UserView`] projection.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     profile_image_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Email matching is case-sensitive: the address is stored and compared
/// exactly as given at registration.
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::models::user::{CreateUser, User, UserRole};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Jane Doe".to_string(),
///         email: "jane@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         role: UserRole::Member,
///         profile_image_url: None,
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "jane@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Role of a user account
///
/// Exactly two values: admins have full visibility and user management,
/// members are scoped to tasks they are assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full visibility and management
    Admin,

    /// Scoped to own assignments
    Member,
}

impl UserRole {
    /// Converts role to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }

    /// Checks if this role satisfies the required role
    ///
    /// Hierarchy: admin > member.
    pub fn has_permission(&self, required: UserRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            UserRole::Admin => 2,
            UserRole::Member => 1,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique, case-sensitive as stored)
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never serialize this to clients; use [`UserView`] for responses.
    pub password_hash: String,

    /// Role of the account
    pub role: UserRole,

    /// Optional profile picture URL
    pub profile_image_url: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Client-safe projection of a user
///
/// The only user shape that crosses the API boundary; the password hash is
/// structurally absent rather than skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image_url: user.profile_image_url.clone(),
            created_at: user.created_at,
        }
    }
}

/// User row annotated with task counts, for the admin user listing
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTaskCounts {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
    pub role: UserRole,
    pub profile_image_url: Option<String>,
}

/// Input for updating an existing user
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub profile_image_url: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error on a duplicate email (unique constraint) or
    /// connection failure.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role, profile_image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, profile_image_url,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.profile_image_url)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, profile_image_url,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email (exact, case-sensitive match)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, profile_image_url,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Loads several users at once
    ///
    /// Used to resolve assignee identities for task responses in a single
    /// round trip. Unknown ids are silently absent from the result.
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, profile_image_url,
                   created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Checks that every id in the slice refers to an existing user
    ///
    /// Write-time referential check for task assignees.
    pub async fn all_exist(pool: &PgPool, ids: &[Uuid]) -> Result<bool, sqlx::Error> {
        if ids.is_empty() {
            return Ok(true);
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT id) FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_one(pool)
                .await?;

        let mut distinct: Vec<Uuid> = ids.to_vec();
        distinct.sort();
        distinct.dedup();

        Ok(count as usize == distinct.len())
    }

    /// Updates an existing user
    ///
    /// Only fields present in `data` are written; `updated_at` is always
    /// refreshed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the new email collides with another
    /// account.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.profile_image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", profile_image_url = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, email, password_hash, role, \
             profile_image_url, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(profile_image_url) = data.profile_image_url {
            q = q.bind(profile_image_url);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user and scrubs them from task assignments
    ///
    /// Runs in one transaction: the user's id is removed from every task's
    /// `assigned_to` array, then the row is deleted (`created_by` references
    /// become NULL via the foreign key). Leaving dangling assignee ids would
    /// make previously valid tasks fail the write-time existence check and
    /// skew per-assignee reporting.
    ///
    /// # Returns
    ///
    /// True if the user existed and was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE tasks
            SET assigned_to = array_remove(assigned_to, $1),
                updated_at = NOW()
            WHERE $1 = ANY(assigned_to)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users annotated with per-status task counts
    ///
    /// A user's counts cover the tasks they are assigned to, in the same
    /// sense the member-scoped task listing uses.
    pub async fn list_with_task_counts(
        pool: &PgPool,
    ) -> Result<Vec<UserWithTaskCounts>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserWithTaskCounts>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.profile_image_url, u.created_at,
                   COUNT(t.id) FILTER (WHERE t.status = 'pending')     AS pending_tasks,
                   COUNT(t.id) FILTER (WHERE t.status = 'in-progress') AS in_progress_tasks,
                   COUNT(t.id) FILTER (WHERE t.status = 'completed')   AS completed_tasks
            FROM users u
            LEFT JOIN tasks t ON u.id = ANY(t.assigned_to)
            GROUP BY u.id
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(UserRole::Admin.has_permission(UserRole::Admin));
        assert!(UserRole::Admin.has_permission(UserRole::Member));
        assert!(UserRole::Member.has_permission(UserRole::Member));
        assert!(!UserRole::Member.has_permission(UserRole::Admin));
    }

    #[test]
    fn test_role_serde_wire_format() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<UserRole>("\"member\"").unwrap(),
            UserRole::Member
        );
        // Anything outside the two enumerated values is rejected
        assert!(serde_json::from_str::<UserRole>("\"owner\"").is_err());
    }

    #[test]
    fn test_user_view_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::Member,
            profile_image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = UserView::from(&user);
        let json = serde_json::to_string(&view).unwrap();

        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
        assert!(json.contains("test@example.com"));
    }

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.profile_image_url.is_none());
    }
}
