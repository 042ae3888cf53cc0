//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`export`] - Journey export download
//! - [`system`] - Health, OpenAPI, fallback

mod export;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use export::*;
pub use system::*;
