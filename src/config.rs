//! Configuration for Tribunal
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;

use crate::clock::{DayPolicy, MAX_OFFSET_MINUTES};

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// MongoDB replica set (transactions required)
    Mongo,
    /// Process-local store, contents lost on exit
    Memory,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Tribunal - community verdict ledger
#[derive(Parser, Debug, Clone)]
#[command(name = "tribunal")]
#[command(about = "Case/verdict ledger with daily quotas and vote-gated comments")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Storage backend
    #[arg(long, env = "STORE", value_enum, default_value = "mongo")]
    pub store: StoreKind,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "tribunal")]
    pub mongodb_db: String,

    /// Enable development mode (falls back to the memory store, moderator key optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// API key for the moderation endpoints
    #[arg(long, env = "API_KEY_MODERATOR")]
    pub api_key_moderator: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Offset from UTC, in minutes, of the reference time zone for daily quotas
    #[arg(long, env = "DAY_OFFSET_MINUTES", default_value = "0", allow_hyphen_values = true)]
    pub day_offset_minutes: i32,

    /// Attempts per transaction on transient store errors
    #[arg(long, env = "TXN_RETRIES", default_value = "3")]
    pub txn_retries: u32,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.api_key_moderator.is_none() {
            return Err("API_KEY_MODERATOR is required in production mode".to_string());
        }

        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.day_offset_minutes) {
            return Err(format!(
                "DAY_OFFSET_MINUTES must be within -{0}..={0}",
                MAX_OFFSET_MINUTES
            ));
        }

        if self.txn_retries == 0 {
            return Err("TXN_RETRIES must be at least 1".to_string());
        }

        Ok(())
    }

    /// Day boundary policy for quota resets
    pub fn day_policy(&self) -> DayPolicy {
        DayPolicy::with_offset_minutes(self.day_offset_minutes).unwrap_or_default()
    }
}
