// Application state module
// Read-only state shared by every connection

use std::io;

use super::types::Config;
use crate::path::MediaRoot;

/// Application state
///
/// Built once at startup and shared behind an `Arc`; nothing in it changes
/// while the server runs.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub root: MediaRoot,
}

impl AppState {
    /// Validate the media root and freeze the configuration
    pub fn new(config: Config) -> io::Result<Self> {
        let root = MediaRoot::new(&config.media.root)?;
        Ok(Self { config, root })
    }

    /// Whether per-request access lines are written
    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
