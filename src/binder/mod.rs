//! Generic request binder.
//!
//! Every list/detail/create/update route needs the same shape of decoding: a
//! query filter, a path id, or a JSON body turned into a typed value before
//! the handler runs. The binder is that one reusable step - a per-route layer
//! that decodes a configured request source into a configured target type,
//! stores it as a [`Bound<T>`] request extension, and short-circuits with the
//! configured error response when decoding fails.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{to_bytes, Body};
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Request bodies above this size are rejected during binding.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Where the binder reads its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSource {
    Body,
    Query,
    Params,
    Cookie,
}

impl std::fmt::Display for BindSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BindSource::Body => "body",
            BindSource::Query => "query",
            BindSource::Params => "params",
            BindSource::Cookie => "cookie",
        };
        write!(f, "{}", name)
    }
}

/// Decode target for the binder.
///
/// `FIELD_DRIVEN` is true for DTO structs decodable from key=value pairs
/// (query strings, path params, cookies) and false for free-form JSON
/// targets, which only the Body source can populate. Use [`bindable!`] to
/// mark DTO structs.
pub trait BindTarget: DeserializeOwned {
    const FIELD_DRIVEN: bool;
}

impl BindTarget for serde_json::Value {
    const FIELD_DRIVEN: bool = false;
}

impl BindTarget for serde_json::Map<String, serde_json::Value> {
    const FIELD_DRIVEN: bool = false;
}

/// Mark DTO structs as field-driven bind targets, usable with every source.
#[macro_export]
macro_rules! bindable {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::binder::BindTarget for $t {
                const FIELD_DRIVEN: bool = true;
            }
        )+
    };
}

/// Per-request decode failure, handed to the configured error handler.
#[derive(Debug)]
pub struct BindError {
    pub source: BindSource,
    pub detail: String,
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to decode request {}: {}", self.source, self.detail)
    }
}

impl std::error::Error for BindError {}

/// Misconfigured binder. Raised while building the router, never per-request.
#[derive(Debug)]
pub struct BindConfigError {
    pub source: BindSource,
}

impl std::fmt::Display for BindConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} binding is field-driven and requires a struct target",
            self.source
        )
    }
}

impl std::error::Error for BindConfigError {}

/// The decoded value, stored in request extensions for the handler to pick
/// up via `Extension<Bound<T>>`.
#[derive(Debug, Clone)]
pub struct Bound<T>(pub T);

type ErrorHandler = Arc<dyn Fn(BindError) -> Response + Send + Sync>;

/// Builder for a binding layer.
pub struct Binder<T: BindTarget> {
    source: BindSource,
    skip: Option<fn(&Parts) -> bool>,
    on_error: ErrorHandler,
    _marker: PhantomData<fn() -> T>,
}

impl<T: BindTarget> std::fmt::Debug for Binder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("source", &self.source)
            .field("skip", &self.skip.map(|_| "<fn>"))
            .field("on_error", &"<fn>")
            .finish()
    }
}

impl<T: BindTarget> Binder<T> {
    /// Bind the JSON request body. Accepts any target, including the default
    /// free-form map.
    pub fn body() -> Self {
        Self {
            source: BindSource::Body,
            skip: None,
            on_error: Arc::new(default_error_response),
            _marker: PhantomData,
        }
    }

    /// Bind from the configured source. Non-Body sources reject free-form
    /// targets here, at router construction, so a bad pairing can never
    /// surface as a per-request error.
    pub fn new(source: BindSource) -> Result<Self, BindConfigError> {
        if source != BindSource::Body && !T::FIELD_DRIVEN {
            return Err(BindConfigError { source });
        }
        Ok(Self {
            source,
            skip: None,
            on_error: Arc::new(default_error_response),
            _marker: PhantomData,
        })
    }

    pub fn query() -> Result<Self, BindConfigError> {
        Self::new(BindSource::Query)
    }

    pub fn params() -> Result<Self, BindConfigError> {
        Self::new(BindSource::Params)
    }

    pub fn cookie() -> Result<Self, BindConfigError> {
        Self::new(BindSource::Cookie)
    }

    /// Bypass binding entirely for requests matching the predicate.
    pub fn skip_if(mut self, predicate: fn(&Parts) -> bool) -> Self {
        self.skip = Some(predicate);
        self
    }

    /// Replace the default 400 response built from the decode error.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(BindError) -> Response + Send + Sync + 'static,
    {
        self.on_error = Arc::new(handler);
        self
    }

    pub fn into_layer(self) -> BindLayer<T> {
        BindLayer {
            config: Arc::new(BindConfig {
                source: self.source,
                skip: self.skip,
                on_error: self.on_error,
                _marker: PhantomData,
            }),
        }
    }
}

fn default_error_response(err: BindError) -> Response {
    ApiError::bad_request(err.to_string()).into_response()
}

struct BindConfig<T> {
    source: BindSource,
    skip: Option<fn(&Parts) -> bool>,
    on_error: ErrorHandler,
    _marker: PhantomData<fn() -> T>,
}

pub struct BindLayer<T> {
    config: Arc<BindConfig<T>>,
}

impl<T> Clone for BindLayer<T> {
    fn clone(&self) -> Self {
        Self { config: self.config.clone() }
    }
}

impl<S, T> tower::Layer<S> for BindLayer<T> {
    type Service = BindService<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        BindService { inner, config: self.config.clone() }
    }
}

pub struct BindService<S, T> {
    inner: S,
    config: Arc<BindConfig<T>>,
}

impl<S: Clone, T> Clone for BindService<S, T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), config: self.config.clone() }
    }
}

impl<S, T> tower::Service<Request<Body>> for BindService<S, T>
where
    S: tower::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    T: BindTarget + Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Swap in the clone so the original (polled-ready) service does the work
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();

        Box::pin(async move {
            match bind_request::<T>(&config, request).await {
                Ok(request) => inner.call(request).await,
                Err(response) => Ok(response),
            }
        })
    }
}

/// Decode the configured source into a fresh `T` and attach it to the
/// request. A decode failure yields the error handler's response and the
/// inner service is never called.
async fn bind_request<T>(
    config: &BindConfig<T>,
    request: Request<Body>,
) -> Result<Request<Body>, Response>
where
    T: BindTarget + Clone + Send + Sync + 'static,
{
    let (mut parts, body) = request.into_parts();

    if let Some(skip) = config.skip {
        if skip(&parts) {
            return Ok(Request::from_parts(parts, body));
        }
    }

    let fail = |detail: String| BindError { source: config.source, detail };

    let (decoded, body) = match config.source {
        BindSource::Body => {
            let bytes = to_bytes(body, BODY_LIMIT)
                .await
                .map_err(|e| (config.on_error)(fail(e.to_string())))?;
            let decoded = serde_json::from_slice::<T>(&bytes)
                .map_err(|e| (config.on_error)(fail(e.to_string())))?;
            // Hand the bytes back so the body stays readable downstream
            (decoded, Body::from(bytes))
        }
        BindSource::Query => {
            let query = parts.uri.query().unwrap_or("");
            let decoded = serde_urlencoded::from_str::<T>(query)
                .map_err(|e| (config.on_error)(fail(e.to_string())))?;
            (decoded, body)
        }
        BindSource::Params => {
            let params = RawPathParams::from_request_parts(&mut parts, &())
                .await
                .map_err(|e| (config.on_error)(fail(e.to_string())))?;
            let pairs: Vec<(&str, &str)> = params.iter().collect();
            let decoded = decode_pairs::<T>(&pairs).map_err(|e| (config.on_error)(fail(e)))?;
            (decoded, body)
        }
        BindSource::Cookie => {
            let jar = match CookieJar::from_request_parts(&mut parts, &()).await {
                Ok(jar) => jar,
                Err(never) => match never {},
            };
            let pairs: Vec<(&str, &str)> =
                jar.iter().map(|cookie| (cookie.name(), cookie.value())).collect();
            let decoded = decode_pairs::<T>(&pairs).map_err(|e| (config.on_error)(fail(e)))?;
            (decoded, body)
        }
    };

    parts.extensions.insert(Bound(decoded));
    Ok(Request::from_parts(parts, body))
}

/// Field-driven decode shared by the Params and Cookie sources: re-encode the
/// pairs as a query string and run them through the urlencoded deserializer.
fn decode_pairs<T: DeserializeOwned>(pairs: &[(&str, &str)]) -> Result<T, String> {
    let encoded = serde_urlencoded::to_string(pairs).map_err(|e| e.to_string())?;
    serde_urlencoded::from_str::<T>(&encoded).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    struct Probe {
        #[allow(dead_code)]
        id: u32,
    }

    crate::bindable!(Probe);

    #[test]
    fn body_source_accepts_any_target() {
        let _map = Binder::<serde_json::Map<String, serde_json::Value>>::body();
        let _dto = Binder::<Probe>::body();
    }

    #[test]
    fn field_sources_accept_struct_targets() {
        assert!(Binder::<Probe>::query().is_ok());
        assert!(Binder::<Probe>::params().is_ok());
        assert!(Binder::<Probe>::cookie().is_ok());
    }

    #[test]
    fn field_sources_reject_map_targets_at_configuration_time() {
        let err = Binder::<serde_json::Value>::query().unwrap_err();
        assert_eq!(err.source, BindSource::Query);

        assert!(Binder::<serde_json::Map<String, serde_json::Value>>::params().is_err());
        assert!(Binder::<serde_json::Value>::cookie().is_err());
    }

    #[test]
    fn decode_pairs_round_trips_reserved_characters() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Named {
            name: String,
        }
        let decoded = decode_pairs::<Named>(&[("name", "a&b=c d")]).unwrap();
        assert_eq!(decoded.name, "a&b=c d");
    }
}
