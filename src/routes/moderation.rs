//! Moderation routes (`/admin/*`), guarded by the moderator API key

use hyper::{Method, Request, Response, StatusCode};

use super::{json_response, ledger_error, not_found_response, require_moderator, FullBody};
use crate::ledger::CaseView;
use crate::server::AppState;

/// Dispatch `/admin/{rest..}`
pub async fn handle<B>(
    state: &AppState,
    req: &Request<B>,
    method: &Method,
    rest: &[&str],
) -> Response<FullBody> {
    if let Err(resp) = require_moderator(state, req) {
        return resp;
    }
    let moderation = state.tribunal.moderation();

    match (method, rest) {
        (&Method::GET, ["cases", "pending"]) => match moderation.pending_cases().await {
            Ok(cases) => {
                let views: Vec<CaseView> = cases.into_iter().map(CaseView::owned).collect();
                json_response(StatusCode::OK, &views)
            }
            Err(e) => ledger_error(e),
        },
        (&Method::POST, ["cases", id, "verify"]) => match moderation.verify_case(id).await {
            Ok(case) => json_response(StatusCode::OK, &CaseView::owned(case)),
            Err(e) => ledger_error(e),
        },
        (&Method::POST, ["cases", id, "recount"]) => match moderation.recount(id).await {
            Ok(case) => json_response(StatusCode::OK, &CaseView::owned(case)),
            Err(e) => ledger_error(e),
        },
        (&Method::GET, ["comments", "pending"]) => match moderation.pending_comments().await {
            Ok(comments) => json_response(StatusCode::OK, &comments),
            Err(e) => ledger_error(e),
        },
        (&Method::POST, ["comments", id, "verify"]) => match moderation.verify_comment(id).await {
            Ok(comment) => json_response(StatusCode::OK, &comment),
            Err(e) => ledger_error(e),
        },
        _ => not_found_response(req.uri().path()),
    }
}
