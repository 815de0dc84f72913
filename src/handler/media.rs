//! Media file serving
//!
//! Opens a resolved file, plans the byte window from its size and the
//! `Range` header, and hands the window to the chunked body.

use hyper::Response;
use std::io;
use tokio::fs::File;

use crate::error::ServeError;
use crate::http::stream::{empty_body, window_body};
use crate::http::{build_plan_response, ResponseBody, StreamPlan};
use crate::path::ResolvedPath;

/// Serve a regular file, whole or as a single byte range
///
/// Directories and vanished files are `NotFound`. The size used for range
/// validation comes from the opened handle, so it matches the bytes read.
pub async fn serve_file(
    path: ResolvedPath,
    range_header: Option<&str>,
    is_head: bool,
) -> Result<Response<ResponseBody>, ServeError> {
    let file = match File::open(path.as_path()).await {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ServeError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(ServeError::NotFound);
    }

    let plan = StreamPlan::new(path, metadata.len(), range_header)?;
    Ok(emit(plan, file, is_head))
}

/// Consume the plan and produce the response
fn emit(plan: StreamPlan, file: File, is_head: bool) -> Response<ResponseBody> {
    let len = plan.content_length();
    let body = if is_head || len == 0 {
        empty_body()
    } else {
        let label = plan.path().as_path().display().to_string();
        window_body(file, plan.offset(), len, label)
    };
    build_plan_response(&plan, body)
}
