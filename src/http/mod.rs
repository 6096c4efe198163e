//! HTTP protocol layer module
//!
//! Request parsing, response framing and the protocol-level pieces of
//! static serving (ranges, conditional requests, content types).

pub mod conditional;
pub mod escape;
pub mod headers;
pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use conditional::Conditional;
pub use headers::HeaderMap;
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use request::{Method, Request, Version};
pub use response::{build_error_response, Body, Framing, Response, Status};
