use sqlx::PgPool;

use crate::cache::TtlCache;
use crate::services::{AuthService, DepartmentService, ProductService, ProfileService, UserService};

/// Shared application state handed to every handler.
///
/// Built once in `main` and cloned per request by axum; everything inside is
/// cheaply cloneable (pools and caches are handles).
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthService,
    pub users: UserService,
    pub profiles: ProfileService,
    pub departments: DepartmentService,
    pub products: ProductService,
    /// Per-login attempt counter backing the login rate limit.
    pub login_attempts: TtlCache<String, u32>,
}
