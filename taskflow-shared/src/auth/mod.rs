/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Bearer token generation and validation
/// - [`middleware`]: Request authentication context and credential extraction
/// - [`authorization`]: Role checks applied at the route layer
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Bearer Tokens**: HS256-signed, 30-day expiry, issuer-checked
/// - **Constant-time Comparison**: Verification uses constant-time operations

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
