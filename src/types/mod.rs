//! Shared types for Tribunal

pub mod error;

pub use error::{Result, TribunalError};
