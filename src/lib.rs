//! Media streaming server with HTTP byte-range support
//!
//! Serves files under one root directory over HTTP/1.1, honouring a single
//! `Range: bytes=start-[end]` per request so video players can seek.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod path;
pub mod server;

pub use config::{AppState, Config};
pub use error::ServeError;
