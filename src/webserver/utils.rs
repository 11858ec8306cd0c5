/// Response helpers shared by route handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::TopicError;
use crate::logger::{self, LogTag};
use crate::webserver::models::responses::ErrorResponse;

/// 200 with a JSON body
pub fn success_response<T: Serialize>(data: T) -> Response {
    Json(data).into_response()
}

/// 201 with a JSON body
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON error body `{error, code}`
pub fn error_response(status: StatusCode, message: &str, code: Option<&str>) -> Response {
    let body = ErrorResponse {
        error: message.to_string(),
        code: code.map(str::to_string),
    };
    (status, Json(body)).into_response()
}

/// Map a topic error onto its HTTP status; internal details only reach the log
pub fn topic_error_response(err: &TopicError) -> Response {
    if let TopicError::Internal(detail) = err {
        logger::error(LogTag::Webserver, &format!("Internal error: {}", detail));
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, &err.public_message(), Some(err.code()))
}
