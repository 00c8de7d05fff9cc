//! Domain layer for hookcfg-server.
//!
//! Plain data with no dependencies on sockets, files, or frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - The server configuration structure
//! - The per-request context handed to the application layer
//! - HTTP request/response values that the listener parses and writes
//!
//! # What does NOT belong here?
//!
//! - Any `tokio` or `TcpStream` types
//! - Reading files or environment variables

pub mod config;
pub mod http;
pub mod request;

pub use config::ServerConfig;
pub use http::{HttpRequest, HttpResponse, Method};
pub use request::RequestContext;
