//! tus-axum: Axum adapter for tus-core.
//!
//! Mounts the upload routes of a [`tus_core::TusServer`] on an Axum router,
//! with the protocol middleware, request ids and tracing in place.

pub mod app;
pub mod config;
pub mod middlewares;
pub mod routes;
pub mod state;
mod error;
pub use error::TusAxumError;
pub use state::TusState;

pub use app::TusApp;
pub use config::ServerConfig;
