//! Authentication API Endpoints
//! Mission: Provide register, login and profile endpoints

use crate::api::response::{ApiResponse, Envelope};
use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::{AuthUser, LoginRequest, LoginResponse, RegisterRequest, UserProfile},
    service::{AuthError, AuthService},
    user_store::UserStore,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService<dyn UserStore>>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(
        auth_service: Arc<AuthService<dyn UserStore>>,
        jwt_handler: Arc<JwtHandler>,
    ) -> Self {
        Self {
            auth_service,
            jwt_handler,
        }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Envelope<UserProfile>, AuthApiError> {
    let Json(payload) = payload?;
    payload.validate().map_err(AuthApiError::Validation)?;

    let user = state
        .auth_service
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok(Envelope(
        StatusCode::CREATED,
        ApiResponse::success("user registered successfully", user),
    ))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Envelope<LoginResponse>, AuthApiError> {
    let Json(payload) = payload?;
    payload.validate().map_err(AuthApiError::Validation)?;

    let user = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    let token = state.jwt_handler.issue_token(user.id, &user.email)?;

    info!("✅ Login successful: user {}", user.id);

    Ok(Envelope(
        StatusCode::OK,
        ApiResponse::success(
            "login successful",
            LoginResponse {
                token,
                expires_in: state.jwt_handler.lifetime().num_seconds(),
                user,
            },
        ),
    ))
}

/// Current user profile - GET /api/auth/profile (behind auth middleware)
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Envelope<UserProfile>, AuthApiError> {
    let user = state
        .auth_service
        .get_user_by_id(auth_user.user_id)
        .await?;

    Ok(Envelope(
        StatusCode::OK,
        ApiResponse::success("profile retrieved successfully", user),
    ))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidBody(String),
    Validation(Vec<String>),
    Auth(AuthError),
    Token(TokenError),
}

impl From<JsonRejection> for AuthApiError {
    fn from(rejection: JsonRejection) -> Self {
        AuthApiError::InvalidBody(rejection.body_text())
    }
}

impl From<AuthError> for AuthApiError {
    fn from(err: AuthError) -> Self {
        AuthApiError::Auth(err)
    }
}

impl From<TokenError> for AuthApiError {
    fn from(err: TokenError) -> Self {
        AuthApiError::Token(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match self {
            AuthApiError::InvalidBody(detail) => {
                (StatusCode::BAD_REQUEST, "invalid request body", Some(json!(detail)))
            }
            AuthApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation failed",
                Some(json!(errors.join(", "))),
            ),
            AuthApiError::Auth(err) => match err {
                AuthError::EmailAlreadyExists => (
                    StatusCode::CONFLICT,
                    "registration failed",
                    Some(json!(err.to_string())),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "login failed",
                    Some(json!(err.to_string())),
                ),
                AuthError::UserNotFound => (
                    StatusCode::NOT_FOUND,
                    "user not found",
                    Some(json!(err.to_string())),
                ),
                AuthError::Store(_) | AuthError::Hashing(_) => {
                    error!(error = ?err, "Auth request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error", None)
                }
            },
            AuthApiError::Token(err) => {
                error!(error = ?err, "Token issuance failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error", None)
            }
        };

        Envelope(status, ApiResponse::failure(message, detail)).into_response()
    }
}
