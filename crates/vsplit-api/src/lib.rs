//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video upload and segmentation endpoint
//! - Server-Sent Events progress streams
//! - Output listing, download and clearing
//! - Per-session upload history
//! - Scheduled disk cleanup
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{DiskCleanup, SessionLedger};
pub use state::AppState;
