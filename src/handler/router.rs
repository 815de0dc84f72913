//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! resolution, dispatch to the listing or the media file, and access logging.

use hyper::header::{CONTENT_LENGTH, RANGE, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::{listing, media};
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::path::PathError;

/// Request context encapsulating information needed for request processing
struct RequestContext<'a> {
    path: &'a str,
    is_head: bool,
    /// Raw `Range` value; non-ASCII bytes survive as replacement characters
    /// so the range parser rejects them
    range_header: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Never fails: every error becomes a response. The request body is never
/// read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();

    let ctx = RequestContext {
        path: req.uri().path(),
        is_head: method == Method::HEAD,
        range_header: req
            .headers()
            .get(RANGE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
    };

    let response = match method {
        Method::GET | Method::HEAD => dispatch(&ctx, &state).await,
        Method::OPTIONS => http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };

    if state.access_log() {
        let mut entry =
            AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), ctx.path.to_string());
        entry.http_version = version_label(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.range = ctx.range_header.clone();
        entry.user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Resolve and serve a GET/HEAD request
async fn dispatch(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    finish(ctx, serve(ctx, state).await)
}

/// Turn the serve result into a response, logging I/O failures
fn finish(
    ctx: &RequestContext<'_>,
    result: Result<Response<ResponseBody>, ServeError>,
) -> Response<ResponseBody> {
    match result {
        Ok(response) => response,
        Err(err) => {
            if let ServeError::Io(ref e) = err {
                logger::log_error(&format!("I/O failure serving '{}': {e}", ctx.path));
            }
            http::build_error_response(&err, ctx.is_head)
        }
    }
}

async fn serve(
    ctx: &RequestContext<'_>,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError> {
    let resolved = state.root.resolve(ctx.path).map_err(|e| {
        if e == PathError::Forbidden {
            logger::log_traversal_blocked(ctx.path);
        }
        ServeError::from(e)
    })?;

    if resolved.is_root() {
        return listing::serve_listing(state.root.as_path(), ctx.is_head).await;
    }

    media::serve_file(resolved, ctx.range_header.as_deref(), ctx.is_head).await
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
