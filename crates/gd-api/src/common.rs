//! Common API utilities

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use gd_common::ApiResult;

/// Translate a sentinel result into the HTTP response the facade serves.
/// Error sentinels carry no body, only the status code.
pub fn respond<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        ApiResult::Payload(payload) => (StatusCode::OK, Json(payload)).into_response(),
        ApiResult::NotFound => StatusCode::NOT_FOUND.into_response(),
        ApiResult::MissingPermissions => StatusCode::FORBIDDEN.into_response(),
        ApiResult::UpstreamUnavailable => StatusCode::BAD_GATEWAY.into_response(),
    }
}
