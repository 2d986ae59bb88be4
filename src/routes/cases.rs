//! Case, vote and comment routes (`/api/cases/*`)

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{json_response, ledger_error, read_json, require_identity, viewer_id, FullBody};
use crate::ledger::CaseView;
use crate::model::{CaseDraft, Comment, Verdict, Vote};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub verdict: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteResponse {
    vote: Vote,
    case: CaseView,
}

#[derive(Serialize)]
struct OwnVoteResponse {
    vote: Option<Vote>,
}

#[derive(Serialize)]
struct OwnCommentResponse {
    comment: Option<Comment>,
}

/// GET /api/cases - published cases, most popular first
pub async fn list_cases(state: &AppState) -> Response<FullBody> {
    match state.tribunal.list_verified_cases().await {
        Ok(cases) => {
            let views: Vec<CaseView> = cases.into_iter().map(CaseView::public).collect();
            json_response(StatusCode::OK, &views)
        }
        Err(e) => ledger_error(e),
    }
}

/// POST /api/cases - submit a case for review
pub async fn create_case<B>(state: &AppState, req: Request<B>) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let mut ctx = match require_identity(state, &req).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    let draft: CaseDraft = match read_json(req).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match state.tribunal.create_case(&mut ctx, draft).await {
        Ok(case) => json_response(StatusCode::CREATED, &CaseView::owned(case)),
        Err(e) => ledger_error(e),
    }
}

/// GET /api/cases/{id}
pub async fn get_case<B>(state: &AppState, req: &Request<B>, id: &str) -> Response<FullBody> {
    match state.tribunal.get_case(id, viewer_id(req)).await {
        Ok(case) => json_response(StatusCode::OK, &CaseView::public(case)),
        Err(e) => ledger_error(e),
    }
}

/// POST /api/cases/{id}/votes
pub async fn cast_vote<B>(state: &AppState, req: Request<B>, id: &str) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let mut ctx = match require_identity(state, &req).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    let request: VoteRequest = match read_json(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let verdict: Verdict = match request.verdict.parse() {
        Ok(v) => v,
        Err(e) => return ledger_error(e),
    };

    match state.tribunal.cast_vote(&mut ctx, id, verdict).await {
        Ok(receipt) => json_response(
            StatusCode::CREATED,
            &VoteResponse {
                vote: receipt.vote,
                case: CaseView::public(receipt.case),
            },
        ),
        Err(e) => ledger_error(e),
    }
}

/// GET /api/cases/{id}/vote - the caller's own vote
pub async fn get_own_vote<B>(state: &AppState, req: &Request<B>, id: &str) -> Response<FullBody> {
    let ctx = match require_identity(state, req).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.tribunal.get_own_vote(&ctx, id).await {
        Ok(vote) => json_response(StatusCode::OK, &OwnVoteResponse { vote }),
        Err(e) => ledger_error(e),
    }
}

/// GET /api/cases/{id}/comments - published comments, newest first
pub async fn list_comments(state: &AppState, id: &str) -> Response<FullBody> {
    match state.tribunal.list_verified_comments(id).await {
        Ok(comments) => json_response(StatusCode::OK, &comments),
        Err(e) => ledger_error(e),
    }
}

/// POST /api/cases/{id}/comments
pub async fn submit_comment<B>(state: &AppState, req: Request<B>, id: &str) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let ctx = match require_identity(state, &req).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    let request: CommentRequest = match read_json(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match state.tribunal.submit_comment(&ctx, id, &request.text).await {
        Ok(comment) => json_response(StatusCode::CREATED, &comment),
        Err(e) => ledger_error(e),
    }
}

/// GET /api/cases/{id}/comment - the caller's own comment, pending or not
pub async fn get_own_comment<B>(state: &AppState, req: &Request<B>, id: &str) -> Response<FullBody> {
    let ctx = match require_identity(state, req).await {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };
    match state.tribunal.get_own_comment(&ctx, id).await {
        Ok(comment) => json_response(StatusCode::OK, &OwnCommentResponse { comment }),
        Err(e) => ledger_error(e),
    }
}
