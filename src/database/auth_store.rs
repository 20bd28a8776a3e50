use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::error::DbError;

/// The authenticated actor attached to a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub profile: ProfileRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileRef {
    pub id: Uuid,
    pub name: String,
}

/// Principal plus its authentication record, as one lookup result.
///
/// `token_id` is the revocable session token identifier. `None` means no
/// session has been issued (or it was revoked by a password reset), so no
/// signed token can currently resolve to this account.
#[derive(Debug, Clone)]
pub struct AuthAccount {
    pub principal: Principal,
    pub auth_enabled: bool,
    pub token_id: Option<Uuid>,
    pub password_hash: Option<String>,
}

impl AuthAccount {
    /// An account is usable only when both the user row and its auth record
    /// are enabled.
    pub fn is_enabled(&self) -> bool {
        self.principal.enabled && self.auth_enabled
    }
}

/// Live lookups backing token validation and login.
///
/// Token validity hinges on `find_by_session_token` hitting a row whose
/// current token identifier matches the claim - that lookup, not the token's
/// signature alone, is what makes server-side revocation work.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<AuthAccount>, DbError>;
    async fn find_by_session_token(&self, token_id: Uuid) -> Result<Option<AuthAccount>, DbError>;
}

#[derive(Debug, FromRow)]
struct AuthAccountRow {
    id: Uuid,
    name: String,
    email: String,
    enabled: bool,
    profile_id: Uuid,
    profile_name: String,
    auth_enabled: bool,
    token_id: Option<Uuid>,
    password_hash: Option<String>,
}

impl From<AuthAccountRow> for AuthAccount {
    fn from(row: AuthAccountRow) -> Self {
        AuthAccount {
            principal: Principal {
                id: row.id,
                name: row.name,
                email: row.email,
                enabled: row.enabled,
                profile: ProfileRef { id: row.profile_id, name: row.profile_name },
            },
            auth_enabled: row.auth_enabled,
            token_id: row.token_id,
            password_hash: row.password_hash,
        }
    }
}

const ACCOUNT_SELECT: &str = r#"
    SELECT
        users.id, users.name, users.email, users.enabled, users.profile_id,
        profiles.name AS profile_name,
        auths.enabled AS auth_enabled, auths.token_id, auths.password_hash
    FROM users
    JOIN auths ON auths.user_id = users.id
    JOIN profiles ON profiles.id = users.profile_id
"#;

#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<AuthAccount>, DbError> {
        let sql = format!("{} WHERE users.email = $1", ACCOUNT_SELECT);
        let row = sqlx::query_as::<_, AuthAccountRow>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AuthAccount::from))
    }

    async fn find_by_session_token(&self, token_id: Uuid) -> Result<Option<AuthAccount>, DbError> {
        let sql = format!("{} WHERE auths.token_id = $1", ACCOUNT_SELECT);
        let row = sqlx::query_as::<_, AuthAccountRow>(&sql)
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AuthAccount::from))
    }
}
