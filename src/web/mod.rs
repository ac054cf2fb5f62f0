//! HTTP API module for ByteBucket.
//!
//! A thin axum layer over the storage core: handlers call the repositories
//! and the bucket service and serialize results as JSON.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
