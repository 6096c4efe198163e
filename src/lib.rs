//! statikd: a small static file server
//!
//! Requests are parsed in [`http::request`], resolved and answered by
//! [`handler`], and carried over TCP by [`server`].

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
