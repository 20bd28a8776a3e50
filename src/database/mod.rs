pub mod auth_store;
pub mod departments;
pub mod error;
pub mod manager;
pub mod models;
pub mod products;
pub mod profiles;
pub mod users;

pub use auth_store::{AuthAccount, AuthStore, PgAuthStore, Principal, ProfileRef};
pub use error::DbError;
