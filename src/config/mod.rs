// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, MediaConfig, PerformanceConfig, ServerConfig};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "MEDIA_SERVER_CONFIG";

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from `MEDIA_SERVER_CONFIG` or `config.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence, lowest first: defaults, file, `MEDIA_*` environment.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 32767)?
            .set_default("media.root", ".")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .build()?;

        settings.try_deserialize()
    }

    /// Apply positional `[media_dir] [port]` command-line overrides
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), String> {
        if let Some(dir) = args.first() {
            self.media.root.clone_from(dir);
        }
        if let Some(port) = args.get(1) {
            self.server.port = port
                .parse()
                .map_err(|e| format!("Invalid port '{port}': {e}"))?;
        }
        if args.len() > 2 {
            return Err(format!("Unexpected arguments: {}", args[2..].join(" ")));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
