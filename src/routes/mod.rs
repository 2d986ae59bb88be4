//! HTTP routes for Tribunal
//!
//! JSON in, JSON out. Failures render as `{ "error": message, "code": code }`
//! with the status from [`TribunalError::status_code`].

pub mod cases;
pub mod health;
pub mod moderation;
pub mod profile;

pub use health::health_check;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use crate::ledger::{IdentityContext, Principal};
use crate::server::AppState;
use crate::types::TribunalError;

pub type FullBody = Full<Bytes>;

/// Header carrying the identity provider's stable user id
pub const IDENTITY_ID_HEADER: &str = "x-identity-id";

/// Header carrying the identity provider's display name
pub const IDENTITY_NAME_HEADER: &str = "x-identity-name";

/// Header carrying the moderator API key
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    code: &'a str,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

pub fn error_response(status: StatusCode, error: &str, code: &str) -> Response<FullBody> {
    json_response(status, &ErrorResponse { error, code })
}

/// Render a ledger rejection
pub fn ledger_error(err: TribunalError) -> Response<FullBody> {
    let code = err.code();
    let (status, message) = err.into_status_code_and_body();
    if status.is_server_error() {
        error!("Request failed ({}): {}", code, message);
    }
    error_response(status, &message, code)
}

pub fn not_found_response(path: &str) -> Response<FullBody> {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("No route for {}", path),
        "not_found",
    )
}

/// CORS preflight response
pub fn preflight_response() -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS"));
    response
}

fn header<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Caller's identity id, if the identity headers are present
pub fn viewer_id<B>(req: &Request<B>) -> Option<&str> {
    header(req, IDENTITY_ID_HEADER).map(str::trim).filter(|id| !id.is_empty())
}

/// Establish the caller's context from the identity provider headers
#[allow(clippy::result_large_err)]
pub async fn require_identity<B>(
    state: &AppState,
    req: &Request<B>,
) -> Result<IdentityContext, Response<FullBody>> {
    let Some(id) = header(req, IDENTITY_ID_HEADER) else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Sign in to continue",
            "unauthenticated",
        ));
    };
    let principal =
        Principal::new(id, header(req, IDENTITY_NAME_HEADER)).map_err(ledger_error)?;
    state.tribunal.establish(principal).await.map_err(ledger_error)
}

/// Check the moderator API key
#[allow(clippy::result_large_err)]
pub fn require_moderator<B>(state: &AppState, req: &Request<B>) -> Result<(), Response<FullBody>> {
    match (&state.args.api_key_moderator, header(req, API_KEY_HEADER)) {
        (Some(expected), Some(given)) if expected == given => Ok(()),
        (None, _) if state.args.dev_mode => Ok(()),
        (_, None) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Moderator key required",
            "unauthenticated",
        )),
        _ => {
            warn!("Rejected moderation request with a wrong key");
            Err(error_response(
                StatusCode::FORBIDDEN,
                "Moderator permission required",
                "permission_denied",
            ))
        }
    }
}

/// Read and parse a JSON request body
#[allow(clippy::result_large_err)]
pub async fn read_json<T, B>(req: Request<B>) -> Result<T, Response<FullBody>>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let body_bytes = match req.into_body().collect().await {
        Ok(b) => b.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Invalid body",
                "validation_error",
            ));
        }
    };

    serde_json::from_slice(&body_bytes).map_err(|e| ledger_error(e.into()))
}
