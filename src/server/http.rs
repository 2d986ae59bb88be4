//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::ledger::Tribunal;
use crate::routes::{self, FullBody};
use crate::types::TribunalError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub tribunal: Tribunal,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, tribunal: Tribunal) -> Self {
        Self {
            args,
            tribunal,
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), TribunalError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Tribunal listening on {} ({} store)",
        state.args.listen,
        state.tribunal.store().backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - moderation key optional");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<FullBody>, hyper::Error> {
    debug!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(state, req).await)
}

/// Route a request to its handler
pub async fn route<B>(state: Arc<AppState>, req: Request<B>) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (&method, segments.as_slice()) {
        (&Method::GET, ["health"]) => routes::health_check(&state).await,

        (&Method::OPTIONS, _) => routes::preflight_response(),

        // Public API
        (&Method::GET, ["api", "cases"]) => routes::cases::list_cases(&state).await,
        (&Method::POST, ["api", "cases"]) => routes::cases::create_case(&state, req).await,
        (&Method::GET, ["api", "cases", id]) => routes::cases::get_case(&state, &req, id).await,
        (&Method::POST, ["api", "cases", id, "votes"]) => {
            routes::cases::cast_vote(&state, req, id).await
        }
        (&Method::GET, ["api", "cases", id, "vote"]) => {
            routes::cases::get_own_vote(&state, &req, id).await
        }
        (&Method::GET, ["api", "cases", id, "comments"]) => {
            routes::cases::list_comments(&state, id).await
        }
        (&Method::POST, ["api", "cases", id, "comments"]) => {
            routes::cases::submit_comment(&state, req, id).await
        }
        (&Method::GET, ["api", "cases", id, "comment"]) => {
            routes::cases::get_own_comment(&state, &req, id).await
        }
        (&Method::GET, ["api", "profile"]) => routes::profile::get_profile(&state, &req).await,

        // Moderation
        (_, ["admin", ..]) => routes::moderation::handle(&state, &req, &method, &segments[1..]).await,

        _ => routes::not_found_response(&path),
    }
}
