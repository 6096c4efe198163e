//! MIME type detection module
//!
//! A static extension table with one default entry, optionally extended
//! from configuration or a `type ext ext...` file.

use std::collections::HashMap;
use std::io;
use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Get MIME Content-Type based on a lowercase file extension
///
/// # Examples
/// ```
/// use statikd::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("jpeg")), "image/jpeg");
/// assert_eq!(get_content_type(Some("mp4")), "video/mp4");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("txt" | "asc") => "text/plain",
        Some("md") => "text/markdown",
        Some("xml" | "xsl") => "application/xml",
        Some("dtd") => "application/xml-dtd",
        Some("xslt") => "application/xslt+xml",

        // JavaScript/WASM
        Some("js" | "mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg" | "jpe") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("mpeg" | "mpg" | "mpe") => "video/mpeg",
        Some("mov" | "qt") => "video/quicktime",
        Some("avi") => "video/x-msvideo",

        // Audio
        Some("mp3" | "mp2" | "mpga") => "audio/mpeg",
        Some("ogg") => "application/ogg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz" | "gzip") => "application/gzip",
        Some("tar") => "application/x-tar",

        // Default
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Extension table layered over [`get_content_type`]
#[derive(Debug, Clone)]
pub struct MimeMap {
    overrides: HashMap<String, String>,
    default_type: String,
}

impl Default for MimeMap {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            default_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl MimeMap {
    pub fn new(default_type: impl Into<String>) -> Self {
        Self {
            overrides: HashMap::new(),
            default_type: default_type.into(),
        }
    }

    /// Map `extension` (case-insensitive) to `content_type`
    pub fn insert(&mut self, extension: &str, content_type: impl Into<String>) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.overrides.insert(extension, content_type.into());
    }

    /// Add one `type ext ext...` line; blank lines and `#` comments are skipped
    pub fn add_mimetype_line(&mut self, line: &str) {
        let mut fields = line.split_ascii_whitespace();
        let Some(content_type) = fields.next() else {
            return;
        };
        if content_type.starts_with('#') {
            return;
        }
        for extension in fields {
            self.insert(extension, content_type);
        }
    }

    /// Load every line of a mime.types style file
    pub fn load_file(&mut self, path: &Path) -> io::Result<()> {
        let contents = std::fs::read_to_string(path)?;
        for line in contents.lines() {
            self.add_mimetype_line(line);
        }
        Ok(())
    }

    /// Content type for a path, by its final extension
    pub fn content_type(&self, path: &Path) -> &str {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        if let Some(found) = extension.as_deref().and_then(|e| self.overrides.get(e)) {
            return found;
        }

        match get_content_type(extension.as_deref()) {
            DEFAULT_CONTENT_TYPE => &self.default_type,
            known => known,
        }
    }
}
