use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};

use super::{map_service_error, IdPath};
use crate::binder::Bound;
use crate::database::models::Profile;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::ListResponse;
use crate::services::profile_service::ProfileInput;
use crate::state::AppState;

crate::bindable!(ProfileInput);

/// GET /profiles
pub async fn list(
    State(state): State<AppState>,
    Extension(Bound(filter)): Extension<Bound<Filter>>,
) -> Result<ListResponse<Profile>, ApiError> {
    let (items, total) = state.profiles.list(&filter).await.map_err(map_service_error)?;
    Ok(ListResponse::new(items, &filter, total))
}

/// GET /profiles/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state.profiles.get(path.id).await.map_err(map_service_error)?;
    Ok(Json(profile))
}

/// POST /profiles
pub async fn create(
    State(state): State<AppState>,
    Extension(Bound(input)): Extension<Bound<ProfileInput>>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let profile = state.profiles.create(input).await.map_err(map_service_error)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT /profiles/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
    Extension(Bound(input)): Extension<Bound<ProfileInput>>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state.profiles.update(path.id, input).await.map_err(map_service_error)?;
    Ok(Json(profile))
}

/// DELETE /profiles/:id - 400 when users still reference the profile.
pub async fn delete(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<StatusCode, ApiError> {
    state.profiles.delete(path.id).await.map_err(map_service_error)?;
    Ok(StatusCode::NO_CONTENT)
}
