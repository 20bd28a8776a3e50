use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};

use super::{map_service_error, IdPath};
use crate::binder::Bound;
use crate::database::models::Department;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::ListResponse;
use crate::services::department_service::DepartmentInput;
use crate::state::AppState;

crate::bindable!(DepartmentInput);

/// GET /departments
pub async fn list(
    State(state): State<AppState>,
    Extension(Bound(filter)): Extension<Bound<Filter>>,
) -> Result<ListResponse<Department>, ApiError> {
    let (items, total) = state.departments.list(&filter).await.map_err(map_service_error)?;
    Ok(ListResponse::new(items, &filter, total))
}

/// GET /departments/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<Json<Department>, ApiError> {
    let department = state.departments.get(path.id).await.map_err(map_service_error)?;
    Ok(Json(department))
}

/// POST /departments
pub async fn create(
    State(state): State<AppState>,
    Extension(Bound(input)): Extension<Bound<DepartmentInput>>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    let department = state.departments.create(input).await.map_err(map_service_error)?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// PUT /departments/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
    Extension(Bound(input)): Extension<Bound<DepartmentInput>>,
) -> Result<Json<Department>, ApiError> {
    let department =
        state.departments.update(path.id, input).await.map_err(map_service_error)?;
    Ok(Json(department))
}

/// DELETE /departments/:id - 400 when products still reference it.
pub async fn delete(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<StatusCode, ApiError> {
    state.departments.delete(path.id).await.map_err(map_service_error)?;
    Ok(StatusCode::NO_CONTENT)
}
