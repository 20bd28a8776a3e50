pub mod auth;
pub mod departments;
pub mod products;
pub mod profiles;
pub mod users;

use serde::Deserialize;
use uuid::Uuid;

use crate::binder::{BindLayer, BindTarget, Binder};
use crate::error::{ApiError, CRUD_ERRORS};
use crate::services::ServiceError;

/// Path parameter target shared by every detail route.
#[derive(Debug, Clone, Deserialize)]
pub struct IdPath {
    pub id: Uuid,
}

crate::bindable!(IdPath, crate::filter::Filter);

/// Binder for `/:id` routes. Built once per route at router construction.
pub fn id_binder() -> BindLayer<IdPath> {
    Binder::<IdPath>::params()
        .expect("IdPath is a field-driven struct")
        .into_layer()
}

/// Query-string binder for list routes.
pub fn query_binder<T: BindTarget>() -> BindLayer<T> {
    Binder::<T>::query()
        .expect("query binding requires a field-driven struct target")
        .into_layer()
}

/// JSON body binder for create/update routes.
pub fn body_binder<T: BindTarget>() -> BindLayer<T> {
    Binder::<T>::body().into_layer()
}

/// Shared service-to-HTTP error mapping for CRUD routes: validation detail
/// as 400, storage sentinels through the route error table, everything else
/// logged and masked as 500.
pub fn map_service_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation(fields) => ApiError::validation_error("Invalid fields", Some(fields)),
        ServiceError::Db(db) => CRUD_ERRORS.resolve(db),
        ServiceError::Password(e) => {
            tracing::error!("password hashing error: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
    }
}
