//! Error taxonomy
//!
//! Every rejection the server produces maps onto one of these variants,
//! and every variant maps onto exactly one status line.

use crate::http::response::Status;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServeError {
    /// Request line or header block could not be understood
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// Method other than GET or HEAD
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    /// URL is syntactically unusable or climbs above the root
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("range not satisfiable")]
    RangeUnsatisfiable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServeError {
    pub const fn status(&self) -> Status {
        match self {
            Self::MalformedRequest(_) | Self::UnsupportedMethod(_) | Self::InvalidUrl(_) => {
                Status::BadRequest
            }
            Self::NotFound(_) => Status::NotFound,
            Self::Forbidden(_) => Status::Forbidden,
            Self::RangeUnsatisfiable => Status::RangeNotSatisfiable,
            Self::Internal(_) => Status::InternalServerError,
        }
    }

    /// Human-readable sentence for the error page body
    pub fn reason(&self) -> String {
        match self {
            Self::MalformedRequest(_) => {
                "You sent a request that the server couldn't understand.".to_string()
            }
            Self::UnsupportedMethod(method) => {
                format!("The method you specified ({method}) is not implemented.")
            }
            Self::InvalidUrl(url) => format!("You requested an invalid URL: {url}"),
            Self::NotFound(url) => format!("The URL you requested ({url}) was not found."),
            Self::Forbidden(url) => {
                format!("You don't have permission to access {url}.")
            }
            Self::RangeUnsatisfiable => "You requested a range outside of the file.".to_string(),
            Self::Internal(detail) => {
                format!("The URL you requested cannot be returned: {detail}.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServeError::InvalidUrl("/../".into()).status(),
            Status::BadRequest
        );
        assert_eq!(
            ServeError::UnsupportedMethod("POST".into()).status(),
            Status::BadRequest
        );
        assert_eq!(ServeError::NotFound("/x".into()).status(), Status::NotFound);
        assert_eq!(
            ServeError::RangeUnsatisfiable.status(),
            Status::RangeNotSatisfiable
        );
    }

    #[test]
    fn test_invalid_url_reason_names_input() {
        let reason = ServeError::InvalidUrl("dir/../".into()).reason();
        assert_eq!(reason, "You requested an invalid URL: dir/../");
    }
}
