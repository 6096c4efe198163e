//! Request handler module
//!
//! Path resolution, directory listings and static file responses.

pub mod listing;
pub mod resolver;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, reject};
