/// Role checks applied at the route layer
///
/// TaskFlow has a flat two-role model: `admin` sees and manages everything,
/// `member` is scoped to their own assignments. Every privileged route calls
/// [`require_role`] once at its top instead of branching on the role string
/// inline, so the authorization decision is a single, greppable capability
/// check.
///
/// # Example
///
/// ```
/// use taskflow_shared::auth::authorization::require_role;
/// use taskflow_shared::auth::middleware::AuthContext;
/// use taskflow_shared::models::user::UserRole;
///
/// fn handler(auth: &AuthContext) -> Result<(), Box<dyn std::error::Error>> {
///     require_role(auth, UserRole::Admin)?;
///     // admin-only work
///     Ok(())
/// }
/// ```

use crate::auth::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is below the required role
    #[error("Access denied: requires {required} role")]
    InsufficientRole {
        required: UserRole,
        actual: UserRole,
    },
}

/// Checks that the caller holds at least the required role
///
/// Hierarchy: admin > member. An admin passes every check; a member passes
/// only member-level checks.
///
/// # Errors
///
/// Returns `AuthzError::InsufficientRole` on mismatch, which the API layer
/// maps to 403 Forbidden.
pub fn require_role(ctx: &AuthContext, required: UserRole) -> Result<(), AuthzError> {
    if ctx.role.has_permission(required) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required,
            actual: ctx.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctx(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_admin_passes_all_checks() {
        let admin = ctx(UserRole::Admin);
        assert!(require_role(&admin, UserRole::Admin).is_ok());
        assert!(require_role(&admin, UserRole::Member).is_ok());
    }

    #[test]
    fn test_member_cannot_pass_admin_check() {
        let member = ctx(UserRole::Member);
        assert!(require_role(&member, UserRole::Member).is_ok());

        let err = require_role(&member, UserRole::Admin).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::InsufficientRole {
                required: UserRole::Admin,
                actual: UserRole::Member,
            }
        ));
    }
}
