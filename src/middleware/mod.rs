pub mod auth;
pub mod response;

pub use auth::{require_auth, AuthGate, CurrentUser};
pub use response::{ListResponse, Pagination};
