mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::handler::Handler;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use tower::ServiceExt;
use uuid::Uuid;

use backoffice_api::binder::{Binder, BindSource, Bound};
use backoffice_api::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
struct CreateItem {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ListQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    page: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ItemPath {
    id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
struct SessionCookies {
    session: String,
    theme: String,
}

backoffice_api::bindable!(CreateItem, ListQuery, ItemPath, SessionCookies);

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn body_binding_decodes_json_into_extension() -> Result<()> {
    let app = Router::new().route(
        "/items",
        post(
            (|Extension(Bound(item)): Extension<Bound<CreateItem>>| async move {
                Json(serde_json::json!({ "name": item.name }))
            })
            .layer(Binder::<CreateItem>::body().into_layer()),
        ),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"stapler"}"#))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "stapler");
    Ok(())
}

#[tokio::test]
async fn malformed_body_short_circuits_before_the_handler() -> Result<()> {
    let reached = Arc::new(AtomicBool::new(false));
    let flag = reached.clone();

    let app = Router::new().route(
        "/items",
        post(
            (move |Extension(Bound(_item)): Extension<Bound<CreateItem>>| {
                let flag = flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    StatusCode::OK
                }
            })
            .layer(Binder::<CreateItem>::body().into_layer()),
        ),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 400);
    assert!(!reached.load(Ordering::SeqCst), "handler must not run after a decode failure");
    Ok(())
}

#[tokio::test]
async fn query_binding_decodes_with_defaults() -> Result<()> {
    let app = Router::new().route(
        "/items",
        get(
            (|Extension(Bound(query)): Extension<Bound<ListQuery>>| async move {
                Json(serde_json::json!({ "search": query.search, "page": query.page }))
            })
            .layer(Binder::<ListQuery>::query().unwrap().into_layer()),
        ),
    );

    let response =
        app.oneshot(Request::builder().uri("/items?search=pen&page=3").body(Body::empty())?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["search"], "pen");
    assert_eq!(body["page"], 3);
    Ok(())
}

#[tokio::test]
async fn params_binding_decodes_path_segments() -> Result<()> {
    let id = Uuid::new_v4();
    let app = Router::new().route(
        "/items/:id",
        get(
            (|Extension(Bound(path)): Extension<Bound<ItemPath>>| async move {
                Json(serde_json::json!({ "id": path.id }))
            })
            .layer(Binder::<ItemPath>::params().unwrap().into_layer()),
        ),
    );

    let response =
        app.oneshot(Request::builder().uri(format!("/items/{}", id)).body(Body::empty())?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], id.to_string());
    Ok(())
}

#[tokio::test]
async fn cookie_binding_decodes_the_jar() -> Result<()> {
    let app = Router::new().route(
        "/prefs",
        get(
            (|Extension(Bound(cookies)): Extension<Bound<SessionCookies>>| async move {
                Json(serde_json::json!({ "session": cookies.session, "theme": cookies.theme }))
            })
            .layer(Binder::<SessionCookies>::cookie().unwrap().into_layer()),
        ),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/prefs")
                .header(header::COOKIE, "session=abc123; theme=dark")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["session"], "abc123");
    assert_eq!(body["theme"], "dark");
    Ok(())
}

#[tokio::test]
async fn skip_predicate_bypasses_binding() -> Result<()> {
    let app = Router::new().route(
        "/items",
        post(
            (|bound: Option<Extension<Bound<CreateItem>>>| async move {
                Json(serde_json::json!({ "bound": bound.is_some() }))
            })
            .layer(
                Binder::<CreateItem>::body()
                    .skip_if(|parts| parts.headers.contains_key("x-skip-binding"))
                    .into_layer(),
            ),
        ),
    );

    // Skipped: malformed body never gets decoded
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header("x-skip-binding", "1")
                .body(Body::from("{not json"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["bound"], false);

    // Not skipped: same body now fails the decode
    let response = app
        .oneshot(Request::builder().method("POST").uri("/items").body(Body::from("{not json"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn custom_error_handler_controls_the_failure_response() -> Result<()> {
    let app = Router::new().route(
        "/items",
        post(
            (|Extension(Bound(_item)): Extension<Bound<CreateItem>>| async { StatusCode::OK })
                .layer(
                    Binder::<CreateItem>::body()
                        .on_error(|err| {
                            ApiError::validation_error(
                                err.to_string(),
                                Some(vec![("body".to_string(), "unreadable".to_string())]),
                            )
                            .into_response()
                        })
                        .into_layer(),
                ),
        ),
    );

    let response = app
        .oneshot(Request::builder().method("POST").uri("/items").body(Body::from("[]"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["object"]["body"], "unreadable");
    Ok(())
}

#[test]
fn non_body_sources_with_map_targets_fail_at_configuration_time() {
    let err = Binder::<serde_json::Value>::query().unwrap_err();
    assert_eq!(err.source, BindSource::Query);

    assert!(Binder::<serde_json::Map<String, serde_json::Value>>::params().is_err());
    assert!(Binder::<serde_json::Value>::cookie().is_err());

    // The same free-form target is fine for the body source
    let _ = Binder::<serde_json::Value>::body();
}
