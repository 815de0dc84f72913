//! Request handler module
//!
//! Request dispatch plus the two things a request can be served: the media
//! index at the root, or a single media file (whole or ranged).

pub mod listing;
pub mod media;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
