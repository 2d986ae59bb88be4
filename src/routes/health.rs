//! Health check endpoint
//!
//! Returns 200 while the store answers a ping, 503 otherwise.

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::{json_response, FullBody};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Seconds since startup
    pub uptime: u64,
    pub store: &'static str,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn health_check(state: &AppState) -> Response<FullBody> {
    let store = state.tribunal.store();
    let ping = store.ping().await;

    let response = HealthResponse {
        healthy: ping.is_ok(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        store: store.backend(),
        mode: if state.args.dev_mode { "development" } else { "production" },
        error: ping.err().map(|e| e.to_string()),
    };

    let status = if response.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    json_response(status, &response)
}
