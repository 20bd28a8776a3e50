use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{map_service_error, IdPath};
use crate::binder::Bound;
use crate::database::models::UserWithProfile;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::ListResponse;
use crate::services::user_service::{CreateUserInput, UpdateUserInput};
use crate::state::AppState;

/// Query surface of GET /users: the common filter fields plus the
/// entity-specific profile filter.
#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub order: String,
    pub profile_id: Option<Uuid>,
}

crate::bindable!(ListUsersQuery, CreateUserInput, UpdateUserInput);

impl ListUsersQuery {
    fn filter(&self) -> Filter {
        Filter {
            search: self.search.clone(),
            page: self.page,
            limit: self.limit,
            sort: self.sort.clone(),
            order: self.order.clone(),
        }
    }
}

/// GET /users - search spans name and email.
pub async fn list(
    State(state): State<AppState>,
    Extension(Bound(query)): Extension<Bound<ListUsersQuery>>,
) -> Result<ListResponse<UserWithProfile>, ApiError> {
    let filter = query.filter();
    let (items, total) = state
        .users
        .list(&filter, query.profile_id)
        .await
        .map_err(map_service_error)?;
    Ok(ListResponse::new(items, &filter, total))
}

/// GET /users/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<Json<UserWithProfile>, ApiError> {
    let user = state.users.get(path.id).await.map_err(map_service_error)?;
    Ok(Json(user))
}

/// POST /users
pub async fn create(
    State(state): State<AppState>,
    Extension(Bound(input)): Extension<Bound<CreateUserInput>>,
) -> Result<(StatusCode, Json<UserWithProfile>), ApiError> {
    let user = state.users.create(input).await.map_err(map_service_error)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /users/:id - full update; may set or reset the password, which
/// rotates or clears the account's session token identifier.
pub async fn update(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
    Extension(Bound(input)): Extension<Bound<UpdateUserInput>>,
) -> Result<Json<UserWithProfile>, ApiError> {
    let user = state.users.update(path.id, input).await.map_err(map_service_error)?;
    Ok(Json(user))
}

/// DELETE /users/:id - cascades to the auth record.
pub async fn delete(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(path.id).await.map_err(map_service_error)?;
    Ok(StatusCode::NO_CONTENT)
}
