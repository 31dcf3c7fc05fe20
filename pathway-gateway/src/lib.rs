//! Pathway Gateway - HTTP surface for learning pathway generation
//!
//! ## Routes
//!
//! - `GET /api/pathway` - generate a pathway from a five-field brief
//! - `POST /api/regenerate` - replace one step or activity
//! - `POST /api/pathway-details` - draft a brief from a free-text idea
//! - `GET /health`, `GET /ready` - liveness and readiness probes
//!
//! All `/api/*` routes require `Authorization: Bearer <token>` unless the
//! gateway runs in development mode.

pub mod auth;
pub mod config;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{dispatch, handle, run, AppState};
pub use types::{GatewayError, Result};
