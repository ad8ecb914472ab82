use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use super::service::MediaService;
use crate::access::Caller;
use crate::error::ServiceError;
use crate::http::created;

/// Upload endpoint plus public retrieval of stored objects.
pub fn media_router(service: Arc<MediaService>) -> Router {
    Router::new()
        .route("/api/v1/media", post(upload_handler))
        .route("/media/:key", get(fetch_handler))
        .with_state(service)
}

pub(crate) async fn upload_handler(
    State(service): State<Arc<MediaService>>,
    caller: Caller,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let object = service.upload(&caller, content_type, body)?;
    Ok(created("media uploaded", object))
}

pub(crate) async fn fetch_handler(
    State(service): State<Arc<MediaService>>,
    Path(key): Path<String>,
) -> Result<Response, ServiceError> {
    let stored = service.fetch(&key)?;
    let content_type = HeaderValue::from_str(stored.content_type.as_ref())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    Ok(([(header::CONTENT_TYPE, content_type)], stored.bytes).into_response())
}
