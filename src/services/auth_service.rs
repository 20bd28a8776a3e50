use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password;
use crate::auth::{TokenError, TokenSigner};
use crate::database::{AuthStore, DbError, Principal};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No account for the presented login. Surfaced as 404 by the handler.
    #[error("unknown login")]
    UnknownLogin,

    /// Disabled account, unset password, bad password or missing session
    /// identity - all collapse into one variant so the handler can emit a
    /// single 401 without leaking which check failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] DbError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: Principal,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login and refresh flows over the auth store and the two token signers.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    access: TokenSigner,
    refresh: TokenSigner,
}

impl AuthService {
    pub fn new(store: Arc<dyn AuthStore>, access: TokenSigner, refresh: TokenSigner) -> Self {
        Self { store, access, refresh }
    }

    /// Verify credentials and issue a fresh access/refresh pair bound to the
    /// account's current session token identifier.
    pub async fn login(&self, login: &str, plain_password: &str) -> Result<LoginOutput, AuthError> {
        let account =
            self.store.find_by_login(login).await?.ok_or(AuthError::UnknownLogin)?;

        if !account.is_enabled() {
            return Err(AuthError::InvalidCredentials);
        }

        // No stored hash means the invite flow never completed; the account
        // cannot log in yet.
        let hash = account.password_hash.as_deref().ok_or(AuthError::InvalidCredentials)?;

        let matches = password::verify_password(plain_password, hash).map_err(|e| {
            tracing::error!("password verification failed for {}: {}", account.principal.id, e);
            AuthError::InvalidCredentials
        })?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        // Invariant: a set password coexists with a session token identifier.
        // A row violating it is treated as unusable credentials.
        let token_id = account.token_id.ok_or(AuthError::InvalidCredentials)?;

        Ok(LoginOutput {
            user: account.principal,
            access_token: self.access.issue(token_id)?,
            refresh_token: self.refresh.issue(token_id)?,
        })
    }

    /// Issue a new pair for an already-validated session. The refresh gate
    /// performed the live lookup, so only signing happens here; the new
    /// tokens carry the same session identifier as the presented one.
    pub fn refresh(&self, session_token_id: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.access.issue(session_token_id)?,
            refresh_token: self.refresh.issue(session_token_id)?,
        })
    }
}
