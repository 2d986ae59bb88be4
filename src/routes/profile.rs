//! Profile route (`/api/profile`)

use hyper::{Request, Response, StatusCode};

use super::{json_response, ledger_error, require_identity, FullBody};
use crate::server::AppState;

/// GET /api/profile - stats, quota status, verdict breakdown and history of the caller
pub async fn get_profile<B>(state: &AppState, req: &Request<B>) -> Response<FullBody> {
    let ctx = match require_identity(state, req).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.tribunal.get_profile(&ctx).await {
        Ok(profile) => json_response(StatusCode::OK, &profile),
        Err(e) => ledger_error(e),
    }
}
