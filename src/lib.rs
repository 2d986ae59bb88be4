//! Tribunal - community verdict ledger
//!
//! Members submit narrative cases, the community casts binary verdicts on
//! them, and judges may attach one comment per case after voting.
//!
//! ## Components
//!
//! - **Ledger**: quota gating, case creation, vote recording, comment gating and profile rollups
//! - **Store**: `LedgerStore` seam with MongoDB and in-memory backends
//! - **Server**: JSON API over hyper for the presentation layer and moderators

pub mod clock;
pub mod config;
pub mod db;
pub mod ledger;
pub mod model;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use ledger::Tribunal;
pub use server::{run, AppState};
pub use types::{Result, TribunalError};
