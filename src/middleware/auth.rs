use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::TokenVerifier;
use crate::database::{AuthStore, Principal};
use crate::error::ApiError;

/// Every authentication failure gets this one message. Expired, revoked and
/// disabled are deliberately indistinguishable to the client.
const UNAUTHORIZED_MESSAGE: &str = "Invalid or expired credentials";

/// Opt-in header for the test-only bypass. Ignored unless the gate was built
/// with the bypass flag enabled.
pub const BYPASS_HEADER: &str = "x-auth-bypass";

/// Authenticated principal attached to the request after the gate passes.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub principal: Principal,
    /// Session token identifier the presented token was bound to; the
    /// refresh endpoint re-issues tokens against it.
    pub session_token_id: Uuid,
}

/// Per-request authentication gate.
///
/// Two instances exist: one holding the access-token verification key, one
/// the refresh-token key. Both are constructed at startup and passed into
/// route registration.
#[derive(Clone)]
pub struct AuthGate {
    verifier: TokenVerifier,
    store: Arc<dyn AuthStore>,
    allow_test_bypass: bool,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier, store: Arc<dyn AuthStore>, allow_test_bypass: bool) -> Self {
        Self { verifier, store, allow_test_bypass }
    }
}

/// Bearer-token middleware: extract, verify, live-lookup, enabled check.
///
/// State machine per request:
/// missing/malformed header -> 401; bad signature or wrong algorithm -> 401;
/// expired -> 401; identifier not bound to any account (revoked) -> 401;
/// account disabled -> 401; otherwise attach [`CurrentUser`] and continue.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if gate.allow_test_bypass && headers.contains_key(BYPASS_HEADER) {
        tracing::warn!("authentication bypassed via {} header", BYPASS_HEADER);
        return Ok(next.run(request).await);
    }

    let token =
        extract_bearer(&headers).ok_or_else(|| ApiError::unauthorized(UNAUTHORIZED_MESSAGE))?;

    let session_token_id = gate.verifier.verify(token).map_err(|e| {
        tracing::debug!("token rejected: {}", e);
        ApiError::unauthorized(UNAUTHORIZED_MESSAGE)
    })?;

    // The live lookup is what enforces revocation: rotating or clearing the
    // stored token_id leaves old tokens pointing at nothing.
    let account = gate
        .store
        .find_by_session_token(session_token_id)
        .await
        .map_err(|e| {
            tracing::error!("session lookup failed: {}", e);
            ApiError::internal_server_error("Failed to validate session")
        })?
        .ok_or_else(|| {
            tracing::debug!("token {} no longer bound to any account", session_token_id);
            ApiError::unauthorized(UNAUTHORIZED_MESSAGE)
        })?;

    if !account.is_enabled() {
        tracing::warn!("disabled account {} presented a valid token", account.principal.id);
        return Err(ApiError::unauthorized(UNAUTHORIZED_MESSAGE));
    }

    request
        .extensions_mut()
        .insert(CurrentUser { principal: account.principal, session_token_id });

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
