//! URL to filesystem resolution
//!
//! The path is percent-decoded first, then normalized purely logically:
//! segments are walked on a stack and a `..` that would pop an empty
//! stack rejects the whole URL, so no resolved path can name an ancestor
//! of the root.

use crate::http::escape::percent_decode;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why a URL did not resolve to something servable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    MissingLeadingSlash,
    EscapesRoot,
    /// A `%00` escape; no filename can contain NUL
    EmbeddedNul,
    NotFound,
    /// Exists but is neither a directory nor a regular file
    NotRegular,
    PermissionDenied,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    Directory(PathBuf),
    File {
        path: PathBuf,
        size: u64,
        modified: SystemTime,
    },
    Invalid(InvalidReason),
}

/// Normalize a decoded path into root-relative components
///
/// Runs of `/` collapse, `.` is dropped and `..` pops; climbing above
/// the root is an error, however many segments follow.
pub fn normalize(path: &[u8]) -> Result<Vec<&[u8]>, InvalidReason> {
    if path.first() != Some(&b'/') {
        return Err(InvalidReason::MissingLeadingSlash);
    }
    if path.contains(&0) {
        return Err(InvalidReason::EmbeddedNul);
    }

    let mut stack = Vec::new();
    for segment in path.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => {}
            b".." => {
                if stack.pop().is_none() {
                    return Err(InvalidReason::EscapesRoot);
                }
            }
            name => stack.push(name),
        }
    }
    Ok(stack)
}

#[cfg(unix)]
fn component_path(component: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(component))
}

#[cfg(not(unix))]
fn component_path(component: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(component).into_owned())
}

/// Resolve a request path (query already stripped, still escaped)
/// against `root` and stat the result once
///
/// # Examples
/// ```
/// use statikd::handler::resolver::{resolve, InvalidReason, ResolvedTarget};
/// use std::path::Path;
///
/// let root = std::env::temp_dir();
/// assert!(matches!(resolve("/dir/..", &root), ResolvedTarget::Directory(_)));
/// assert_eq!(
///     resolve("/../", &root),
///     ResolvedTarget::Invalid(InvalidReason::EscapesRoot)
/// );
/// ```
pub fn resolve(url: &str, root: &Path) -> ResolvedTarget {
    let decoded = percent_decode(url);
    let components = match normalize(&decoded) {
        Ok(components) => components,
        Err(reason) => return ResolvedTarget::Invalid(reason),
    };

    let candidate = components
        .iter()
        .fold(root.to_path_buf(), |path, component| {
            path.join(component_path(component))
        });

    let metadata = match std::fs::metadata(&candidate) {
        Ok(metadata) => metadata,
        Err(e) => return ResolvedTarget::Invalid(classify_io_error(&e)),
    };

    if metadata.is_dir() {
        ResolvedTarget::Directory(candidate)
    } else if metadata.is_file() {
        match metadata.modified() {
            Ok(modified) => ResolvedTarget::File {
                path: candidate,
                size: metadata.len(),
                modified,
            },
            Err(_) => ResolvedTarget::Invalid(InvalidReason::Io),
        }
    } else {
        ResolvedTarget::Invalid(InvalidReason::NotRegular)
    }
}

fn classify_io_error(error: &io::Error) -> InvalidReason {
    match error.kind() {
        // A file used as a directory prefix ("/file.txt/x") reports NotADirectory
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => InvalidReason::NotFound,
        io::ErrorKind::PermissionDenied => InvalidReason::PermissionDenied,
        _ => InvalidReason::Io,
    }
}
