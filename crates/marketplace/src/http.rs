//! Shared response envelope for the component routers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Success body: a human-readable message and the affected resource.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: T,
}

pub fn respond<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    let envelope = Envelope {
        message: message.into(),
        data,
    };
    (status, Json(envelope)).into_response()
}

pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::CREATED, message, data)
}
