/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create an account, returns user + token
/// - `POST /api/auth/login` - Authenticate, returns user + token
/// - `GET  /api/auth/profile` - Caller's own profile
/// - `PUT  /api/auth/profile` - Update caller's own profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskflow_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User, UserRole, UserView},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for strength before hashing)
    pub password: String,

    /// Optional profile image URL (from the upload endpoint)
    pub profile_image_url: Option<String>,

    /// Optional invite code; a match against the configured token grants
    /// the admin role
    pub admin_invite_token: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Profile update request
///
/// All fields optional; only supplied fields change. A supplied password is
/// strength-checked and re-hashed.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    pub profile_image_url: Option<String>,
}

/// Register/login/profile-update response: the user plus a bearer token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserView,

    /// 30-day bearer token
    pub token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Jane Doe",
///   "email": "jane@example.com",
///   "password": "SecureP@ss123",
///   "adminInviteToken": "optional-invite-code"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or weak password
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(ApiError::BadRequest)?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // The invite code is the only path to the admin role through the API
    let role = match (&req.admin_invite_token, &state.config.admin_invite_token) {
        (Some(supplied), Some(expected)) if supplied == expected => UserRole::Admin,
        _ => UserRole::Member,
    };

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role,
            profile_image_url: req.profile_image_url,
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserView::from(&user),
            token,
        }),
    ))
}

/// Login
///
/// Unknown email and wrong password produce the same generic 401 so the
/// response does not reveal which accounts exist.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "jane@example.com", "password": "SecureP@ss123" }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok(Json(AuthResponse {
        user: UserView::from(&user),
        token,
    }))
}

/// Caller's own profile
///
/// # Endpoint
///
/// ```text
/// GET /api/auth/profile
/// Authorization: Bearer <token>
/// ```
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<UserView>> {
    let user = User::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserView::from(&user)))
}

/// Update caller's own profile
///
/// Returns the updated profile and a fresh token.
///
/// # Endpoint
///
/// ```text
/// PUT /api/auth/profile
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "name": "Jane D.", "password": "N3w-Secret!" }
/// ```
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let password_hash = match req.password {
        Some(ref new_password) => {
            password::validate_password_strength(new_password).map_err(ApiError::BadRequest)?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        ctx.user_id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            profile_image_url: req.profile_image_url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok(Json(AuthResponse {
        user: UserView::from(&user),
        token,
    }))
}
