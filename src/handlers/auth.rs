use super::common::{created_response, message_response, success_response, validate_input};
use crate::{
    auth::{AuthError, AuthUser},
    entities::user,
    errors::{ApiError, ServiceError},
    services::users::{NewUser, ProfileChanges},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    #[schema(example = "demo@coapp.local")]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Demo User")]
    pub full_name: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    pub user: UserResponse,
}

/// Routes mounted under `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_profile).put(update_profile))
        .route("/change-password", post(change_password))
        .route("/logout", post(logout))
}

fn token_response(state: &AppState, user: user::Model) -> Result<TokenResponse, ServiceError> {
    let access_token = state.auth.generate_token(&user).map_err(|e| match e {
        AuthError::Service(err) => err,
        other => ServiceError::InternalError(other.to_string()),
    })?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    })
}

/// Register a new user and return an access token
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Invalid input or email already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let created = state
        .services
        .users
        .register(NewUser {
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
        })
        .await?;

    info!(user_id = created.id, "Registration completed");
    Ok(created_response(token_response(&state, created)?))
}

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Incorrect email or password", body = crate::errors::ErrorResponse),
        (status = 403, description = "User account is inactive", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let user = state
        .services
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok(success_response(token_response(&state, user)?))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_profile(auth: AuthUser) -> Json<UserResponse> {
    Json(auth.user.into())
}

/// Update email and/or full name
#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input or email already registered", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    let updated = state
        .services
        .users
        .update_profile(
            auth.id(),
            ProfileChanges {
                email: payload.email,
                full_name: payload.full_name,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = super::common::MessageResponse),
        (status = 400, description = "Current password is incorrect", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    validate_input(&payload)?;

    state
        .services
        .users
        .change_password(auth.id(), &payload.current_password, &payload.new_password)
        .await?;
    Ok(message_response("Password changed successfully"))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = super::common::MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Response {
    state.auth.revoke(auth.token_id, auth.expires_at).await;
    info!(user_id = auth.user.id, "Logged out");
    message_response("Logged out successfully")
}
