//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. [`handle`] checks the
//! request head, reads the body under a size limit, then routes through
//! [`dispatch`].

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{HeaderMap, CONTENT_LENGTH};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use pathway_agent::PathwayService;

use crate::auth::BearerGate;
use crate::routes::{self, error_response, FullBody};
use crate::types::Result;

/// Shared application state
pub struct AppState {
    /// Generation pipelines
    pub service: PathwayService,
    /// Bearer gate for /api/*
    pub gate: BearerGate,
    /// When the gateway started
    pub started: Instant,
    /// Largest request body read before answering 413
    pub max_body_bytes: usize,
}

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

impl AppState {
    pub fn new(service: PathwayService, gate: BearerGate) -> Self {
        Self {
            service,
            gate,
            started: Instant::now(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Accept connections on `listen` until the process exits.
pub async fn run(state: Arc<AppState>, listen: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(listen).await?;

    info!("Pathway gateway listening on {}", listen);

    if state.gate.is_disabled() {
        warn!("Development mode enabled - authentication disabled");
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

/// Log and route one connection request
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<FullBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = handle(&state, req).await;

    info!(
        "[{}] {} {} -> {} ({} ms)",
        addr,
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    Ok(response)
}

/// Answer a request, reading its body only once the head is accepted.
///
/// Preflight and bearer checks run on the head alone. The body is then read
/// up to `max_body_bytes`; anything larger is refused with 413.
pub async fn handle<B>(state: &AppState, req: Request<B>) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();

    if let Some(response) = answer_from_head(state, &parts.method, path, &parts.headers) {
        return response;
    }

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if declared.is_some_and(|length| length > state.max_body_bytes as u64) {
        return payload_too_large(state.max_body_bytes);
    }

    let body = match Limited::new(body, state.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return payload_too_large(state.max_body_bytes)
        }
        Err(e) => {
            warn!("failed to read body for {}: {}", path, e);
            return error_response(StatusCode::BAD_REQUEST, "MissingParameters", "Invalid body");
        }
    };

    dispatch(
        state,
        &parts.method,
        path,
        parts.uri.query(),
        &parts.headers,
        body,
    )
    .await
}

fn payload_too_large(limit: usize) -> Response<FullBody> {
    error_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        "PayloadTooLarge",
        format!("Request body exceeds {} bytes", limit),
    )
}

/// Preflight and authentication, decided from method, path and headers.
fn answer_from_head(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Option<Response<FullBody>> {
    if method == Method::OPTIONS {
        return Some(routes::preflight_response());
    }

    if path.starts_with("/api/") {
        if let Err(failure) = state.gate.check(headers) {
            debug!(path, reason = failure.message(), "Refused unauthenticated request");
            return Some(error_response(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                failure.message(),
            ));
        }
    }

    None
}

/// Route a fully-read request
pub async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response<FullBody> {
    if let Some(response) = answer_from_head(state, method, path, headers) {
        return response;
    }

    match (method, path) {
        // Liveness probe
        (&Method::GET, "/health") => routes::health_check(state),

        // Readiness probe - 200 only if the completion backend answers
        (&Method::GET, "/ready") => routes::readiness_check(state).await,

        (&Method::GET, "/api/pathway") => routes::handle_generate(&state.service, query).await,

        (&Method::POST, "/api/regenerate") => {
            routes::handle_regenerate(&state.service, &body).await
        }

        (&Method::POST, "/api/pathway-details") => {
            routes::handle_pathway_details(&state.service, &body).await
        }

        _ => routes::not_found_response(path),
    }
}
