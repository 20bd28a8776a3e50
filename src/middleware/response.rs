use axum::{
    response::{IntoResponse, Json, Response},
    http::StatusCode,
};
use serde::Serialize;

use crate::filter::Filter;

/// Pagination block reported on every list response.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

/// The `{items, pagination}` envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> ListResponse<T> {
    /// Assemble the envelope from the filter that produced the page. When
    /// pagination was inactive the whole result set is page 1 of 1.
    pub fn new(items: Vec<T>, filter: &Filter, total_items: i64) -> Self {
        Self {
            items,
            pagination: Pagination {
                current_page: filter.current_page(),
                page_size: filter.page_size(total_items),
                total_items,
                total_pages: filter.pages(total_items),
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
