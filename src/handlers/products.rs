use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{map_service_error, IdPath};
use crate::binder::Bound;
use crate::database::models::{Product, ProductWithDepartment};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::ListResponse;
use crate::services::product_service::ProductInput;
use crate::state::AppState;

/// Query surface of GET /products: common filter fields plus the
/// entity-specific department filter.
#[derive(Debug, Clone, Deserialize)]
pub struct ListProductsQuery {
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
    pub department_id: Option<Uuid>,
}

crate::bindable!(ListProductsQuery, ProductInput);

impl ListProductsQuery {
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

/// GET /products - rows join the department name; unqualified sort fields
/// resolve against the products table.
pub async fn list(
    State(state): State<AppState>,
    Extension(Bound(query)): Extension<Bound<ListProductsQuery>>,
) -> Result<ListResponse<ProductWithDepartment>, ApiError> {
    let filter = query.filter();
    let (items, total) = state
        .products
        .list(&filter, query.department_id)
        .await
        .map_err(map_service_error)?;
    Ok(ListResponse::new(items, &filter, total))
}

/// GET /products/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<Json<ProductWithDepartment>, ApiError> {
    let product = state.products.get(path.id).await.map_err(map_service_error)?;
    Ok(Json(product))
}

/// POST /products
pub async fn create(
    State(state): State<AppState>,
    Extension(Bound(input)): Extension<Bound<ProductInput>>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.products.create(input).await.map_err(map_service_error)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /products/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
    Extension(Bound(input)): Extension<Bound<ProductInput>>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.update(path.id, input).await.map_err(map_service_error)?;
    Ok(Json(product))
}

/// DELETE /products/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(Bound(path)): Extension<Bound<IdPath>>,
) -> Result<StatusCode, ApiError> {
    state.products.delete(path.id).await.map_err(map_service_error)?;
    Ok(StatusCode::NO_CONTENT)
}
