//! HTTP API server for external control
//!
//! This module provides a REST API around the single recorder:
//! - POST /recording/start - Start a new recording
//! - POST /recording/stop - Stop the current recording
//! - GET /recording/status - Query session state and last notification
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
