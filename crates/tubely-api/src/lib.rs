//! Tubely API Library
//!
//! This crate provides the HTTP handlers, authentication and application setup.

mod handlers;
pub mod setup;
pub mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod middleware;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
