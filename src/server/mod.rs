//! HTTP server for Tribunal

pub mod http;

pub use http::{route, run, AppState};
