// Application state module
// Immutable serving context plus the runtime counters the transport needs

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use tokio::sync::Notify;

use super::types::Config;
use crate::http::mime::MimeMap;

/// Everything request handling needs, fixed at startup
#[derive(Debug, Clone)]
pub struct ServeContext {
    root: PathBuf,
    mime: MimeMap,
    server_name: String,
}

impl ServeContext {
    pub fn new(root: impl Into<PathBuf>, mime: MimeMap, server_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            mime,
            server_name: server_name.into(),
        }
    }

    /// Build from configuration; the root must be an existing directory
    pub fn from_config(config: &Config) -> io::Result<Self> {
        let root = Path::new(&config.server.root).canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("document root '{}': {e}", config.server.root),
            )
        })?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document root '{}' is not a directory", root.display()),
            ));
        }

        let mut mime = MimeMap::new(config.http.default_content_type.clone());
        if let Some(ref path) = config.http.mime_types_file {
            mime.load_file(Path::new(path)).map_err(|e| {
                io::Error::new(e.kind(), format!("mime types file '{path}': {e}"))
            })?;
        }
        for (extension, content_type) in &config.http.mime_types {
            mime.insert(extension, content_type.clone());
        }

        Ok(Self::new(root, mime, config.http.server_name.clone()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn mime(&self) -> &MimeMap {
        &self.mime
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Attribution line closing every generated page
    pub fn footer(&self) -> String {
        format!("Generated by {}", self.server_name)
    }
}

/// Application state shared by the accept loop and connection tasks
pub struct AppState {
    pub config: Config,
    pub context: std::sync::Arc<ServeContext>,
    pub active_connections: AtomicUsize,
    pub shutdown: Notify,
}

impl AppState {
    pub fn new(config: &Config) -> io::Result<Self> {
        let context = ServeContext::from_config(config)?;
        Ok(Self {
            config: config.clone(),
            context: std::sync::Arc::new(context),
            active_connections: AtomicUsize::new(0),
            shutdown: Notify::new(),
        })
    }
}
