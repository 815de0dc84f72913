//! HTTP protocol layer module
//!
//! Range parsing, stream planning, chunked bodies and response builders,
//! decoupled from request routing.

pub mod mime;
pub mod plan;
pub mod range;
pub mod response;
pub mod stream;

// Re-export commonly used types
pub use plan::StreamPlan;
pub use range::{parse_range_header, ByteRange, RangeError};
pub use response::{
    build_405_response, build_error_response, build_html_response, build_options_response,
    build_plan_response,
};
pub use stream::{ResponseBody, CHUNK_SIZE};
