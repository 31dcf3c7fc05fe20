//! HTTP server

pub mod http;

pub use http::{dispatch, handle, run, AppState, DEFAULT_MAX_BODY_BYTES};
