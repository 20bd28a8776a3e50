use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::binder::Bound;
use crate::config;
use crate::database::{Principal, ProfileRef};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::services::AuthError;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

crate::bindable!(LoginRequest);

/// Wire shape for the authenticated user: the principal with its enabled
/// flag surfaced as `status`.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: bool,
    pub profile: ProfileRef,
}

impl From<Principal> for UserView {
    fn from(p: Principal) -> Self {
        Self { id: p.id, name: p.name, email: p.email, status: p.enabled, profile: p.profile }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /auth - authenticate and receive an access/refresh token pair.
///
/// 404 for an unknown login; 401 for everything else that fails (disabled
/// account, password not yet set, wrong password) without saying which.
pub async fn login(
    State(state): State<AppState>,
    Extension(Bound(payload)): Extension<Bound<LoginRequest>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let settings = &config::config().api;
    if settings.enable_rate_limiting {
        let attempts = state.login_attempts.get(&payload.login).unwrap_or(0) + 1;
        state.login_attempts.set(payload.login.clone(), attempts);
        if attempts > settings.rate_limit_requests {
            tracing::warn!("login rate limit hit for {}", payload.login);
            return Err(ApiError::too_many_requests("Too many login attempts"));
        }
    }

    let output = state
        .auth
        .login(&payload.login, &payload.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(LoginResponse {
        user: UserView::from(output.user),
        access_token: output.access_token,
        refresh_token: output.refresh_token,
    }))
}

/// GET /auth - the principal behind the presented access token.
pub async fn me(
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(UserView::from(current.principal)))
}

/// PUT /auth - trade a valid refresh token for a new token pair.
///
/// The refresh gate already validated the token and resolved the principal;
/// the new pair is bound to the same session token identifier.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let pair = state.auth.refresh(current.session_token_id).map_err(map_auth_error)?;
    Ok(Json(RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::UnknownLogin => ApiError::not_found("Unknown login"),
        AuthError::InvalidCredentials => ApiError::unauthorized("Invalid or expired credentials"),
        AuthError::Store(e) => {
            tracing::error!("auth storage error: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
        AuthError::Token(e) => {
            tracing::error!("token issuance error: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
    }
}
