//! HTTP response building module
//!
//! Builders for every status the server emits. Bodies are [`ResponseBody`]
//! so in-memory and streamed responses share one type.

use hyper::header::{
    HeaderValue, ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, SERVER,
};
use hyper::{Response, StatusCode};

use crate::error::ServeError;
use crate::http::plan::StreamPlan;
use crate::http::stream::{empty_body, full_body, ResponseBody};

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Server header value
pub const SERVER_NAME: &str = concat!("media-range-server/", env!("CARGO_PKG_VERSION"));

/// Build the 200/206 response head for a plan around an already-built body
pub fn build_plan_response(plan: &StreamPlan, body: ResponseBody) -> Response<ResponseBody> {
    let status = if plan.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(SERVER, SERVER_NAME)
        .header(CONTENT_TYPE, plan.content_type())
        .header(CONTENT_LENGTH, plan.content_length())
        .header(ACCEPT_RANGES, "bytes");

    if let Some(range) = plan.range() {
        builder = builder.header(CONTENT_RANGE, range.content_range(plan.total_size()));
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        fallback_response(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Build the response for a request error
///
/// 416 carries `Content-Range: bytes */size`; 500 details go to the error log
/// only, never to the client.
pub fn build_error_response(err: &ServeError, is_head: bool) -> Response<ResponseBody> {
    let status = err.status();
    let message = err.public_message();
    let body = if is_head {
        empty_body()
    } else {
        full_body(message)
    };

    let mut builder = Response::builder()
        .status(status)
        .header(SERVER, SERVER_NAME)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, message.len());

    if let ServeError::RangeNotSatisfiable { size } = err {
        builder = builder.header(CONTENT_RANGE, format!("bytes */{size}"));
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        fallback_response(status)
    })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        empty_body()
    } else {
        full_body(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(SERVER, SERVER_NAME)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            fallback_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let message = "405 Method Not Allowed";
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(SERVER, SERVER_NAME)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, message.len())
        .header(ALLOW, ALLOWED_METHODS)
        .body(full_body(message))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            fallback_response(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(SERVER, SERVER_NAME)
        .header(ALLOW, ALLOWED_METHODS)
        .header(ACCEPT_RANGES, "bytes")
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            fallback_response(StatusCode::NO_CONTENT)
        })
}

/// Last-resort response when the builder rejects a header
fn fallback_response(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
