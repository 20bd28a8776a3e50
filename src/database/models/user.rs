use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub profile_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List-endpoint row: user columns plus the joined profile name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserWithProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub enabled: bool,
    pub profile_id: Uuid,
    pub profile_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
