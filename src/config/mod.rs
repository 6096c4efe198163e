// Configuration module entry point
// Loads layered configuration and builds the immutable serving context

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::{AppState, ServeContext};
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// `Server` header value and footer name when none is configured
pub const DEFAULT_SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Environment variables override the file, e.g.
    /// `STATIKD_SERVER__ROOT=/srv/www`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("STATIKD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.root", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", DEFAULT_SERVER_NAME)?
            .set_default(
                "http.default_content_type",
                crate::http::mime::DEFAULT_CONTENT_TYPE,
            )?
            .set_default("http.max_request_size", 8192)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
