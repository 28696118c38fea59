//! docscan Gateway HTTP API Server
//!
//! Serves document extraction, the health probe and a small service index.

pub mod error;
pub mod extract;
pub mod health_api;
pub mod redact;
pub mod server;
pub mod upload;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState};
