//! Stream planning
//!
//! A [`StreamPlan`] is the validated answer to "which bytes of which file
//! go out, and with what headers". Building one touches only metadata;
//! nothing is opened for reading until the plan is consumed.

use crate::http::mime;
use crate::http::range::{parse_range_header, ByteRange, RangeError};
use crate::path::ResolvedPath;

#[derive(Debug)]
pub struct StreamPlan {
    path: ResolvedPath,
    total_size: u64,
    range: Option<ByteRange>,
    content_type: &'static str,
}

impl StreamPlan {
    /// Validate the optional `Range` header against `total_size`
    pub fn new(
        path: ResolvedPath,
        total_size: u64,
        range_header: Option<&str>,
    ) -> Result<Self, RangeError> {
        let range = parse_range_header(range_header, total_size)?;
        let content_type = mime::get_content_type(path.extension());
        Ok(Self {
            path,
            total_size,
            range,
            content_type,
        })
    }

    pub const fn path(&self) -> &ResolvedPath {
        &self.path
    }

    pub const fn total_size(&self) -> u64 {
        self.total_size
    }

    pub const fn range(&self) -> Option<ByteRange> {
        self.range
    }

    pub const fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Whether the response is 206 rather than 200
    pub const fn is_partial(&self) -> bool {
        self.range.is_some()
    }

    /// File offset the body starts at
    pub const fn offset(&self) -> u64 {
        match self.range {
            Some(r) => r.start(),
            None => 0,
        }
    }

    /// Exact number of body bytes (`Content-Length`)
    pub const fn content_length(&self) -> u64 {
        match self.range {
            Some(r) => r.len(),
            None => self.total_size,
        }
    }
}
