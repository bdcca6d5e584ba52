// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP server
//!
//! Routes requests into the staging store and renders the pages.
//!
//! # Endpoints
//!
//! - `GET /` - Ensure a session exists and render the submission form
//! - `POST /airforce` - Queue a key/value pair (session-gated)
//! - `GET /marine` - Render the session's stored pairs (session-gated)
//! - `GET /image.jpg` - Embedded image
//! - `GET /health` - Health check
//!
//! Any other path renders the index page.
//!
//! # Example
//!
//! ```no_run
//! use jj::{Server, ServiceConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = Server::new(ServiceConfig::from_env().with_port(8080));
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod cookies;
pub mod gate;
pub mod views;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::error::StagingError;
use crate::staging::{PendingItem, StagingStore, SweepWorker};

pub use gate::RequestContext;

/// Maximum request body size (1MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Image served at `/image.jpg`.
static IMAGE: &[u8] = include_bytes!("../../assets/image.png");

/// State shared across handlers.
pub struct AppState {
    /// Session registry, pending queues and stores.
    pub store: Arc<StagingStore>,
    /// Privileged string guarded by the per-request challenge.
    pub secret: Arc<str>,
}

/// The staging service: HTTP surface plus sweep worker.
#[derive(Debug)]
pub struct Server {
    config: ServiceConfig,
    store: Arc<StagingStore>,
}

impl Default for Server {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl Server {
    /// Create a server with a fresh, empty store.
    pub fn new(config: ServiceConfig) -> Self {
        let store = Arc::new(StagingStore::new(config.sanitize_workers));
        Self { config, store }
    }

    /// Handle to the store shared with handlers and the worker.
    pub fn store(&self) -> Arc<StagingStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get the port.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Build the router with all routes.
    pub fn build_router(&self) -> Router {
        router(Arc::new(AppState {
            store: Arc::clone(&self.store),
            secret: Arc::clone(&self.config.secret),
        }))
    }

    /// Bind the configured address and serve until SIGINT/SIGTERM.
    pub async fn start(&self) -> Result<()> {
        let addr = self.config.listen_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                anyhow::anyhow!(
                    "Port {} is already in use. Stop the other instance or pick another port with --port <PORT>",
                    self.config.port
                )
            } else {
                anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
            }
        })?;

        tracing::info!("Starting server on {}", addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, running the sweep
    /// worker alongside. The worker is stopped after the server drains.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;

        let worker = SweepWorker::new(self.store())
            .with_interval(self.config.sweep_interval)
            .spawn();

        let served = axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await;

        worker.shutdown().await;
        tracing::info!("Cleanup complete, shutting down server");
        served?;
        Ok(())
    }
}

/// Build the router over an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/airforce", post(submit_handler))
        .route("/marine", get(marine_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            gate::require_session,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/image.jpg", get(image_handler))
        .route("/health", get(health_handler))
        .merge(gated)
        .fallback(index_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

// =============================================================================
// Request/Response Types
// =============================================================================

const KEY_FIELD: &str = "Jalesveva";
const VALUE_FIELD: &str = "Jayamahe";

/// Submission fields gathered from the query string or the body.
#[derive(Debug, Default, PartialEq)]
struct SubmitFields {
    key: Option<String>,
    value: Option<String>,
}

impl SubmitFields {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut fields = Self::default();
        for (name, value) in pairs {
            fields.set(&name, value);
        }
        fields
    }

    /// Record `value` under `name`. The first occurrence of a field wins.
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            KEY_FIELD => &mut self.key,
            VALUE_FIELD => &mut self.value,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Body fields take precedence; the query string fills the gaps.
    fn or(self, fallback: SubmitFields) -> SubmitFields {
        SubmitFields {
            key: self.key.or(fallback.key),
            value: self.value.or(fallback.value),
        }
    }

    fn into_item(self) -> PendingItem {
        PendingItem::new(
            self.key.unwrap_or_default(),
            self.value.unwrap_or_default(),
        )
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// Reuse the caller's session if it is live, otherwise create one, then
/// (re)issue the cookie and render the form.
async fn index_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session_id = match gate::resolve_session(&state.store, &headers) {
        Ok(id) => id,
        Err(_) => state.store.create_session(),
    };

    (
        [(header::SET_COOKIE, cookies::issue_session_cookie(&session_id))],
        Html(views::index_page()),
    )
        .into_response()
}

/// Queue one pair. Fields may arrive in the query string, a urlencoded
/// body or a multipart body; absent fields are queued as empty strings.
async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    query: Option<Query<Vec<(String, String)>>>,
    request: Request,
) -> Result<Response, StagingError> {
    let from_query = query
        .map(|Query(pairs)| SubmitFields::from_pairs(pairs))
        .unwrap_or_default();
    let fields = body_fields(&state, request).await.or(from_query);

    state.store.submit(&ctx.session_id, fields.into_item())?;
    Ok(redirect_to_root())
}

/// Read submission fields from the request body. Unreadable or
/// unsupported bodies contribute nothing.
async fn body_fields(state: &Arc<AppState>, request: Request) -> SubmitFields {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        match Multipart::from_request(request, state).await {
            Ok(multipart) => multipart_fields(multipart).await,
            Err(e) => {
                tracing::debug!("SUBMIT_BODY_IGNORED | reason={}", e);
                SubmitFields::default()
            }
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        match Form::<Vec<(String, String)>>::from_request(request, state).await {
            Ok(Form(pairs)) => SubmitFields::from_pairs(pairs),
            Err(e) => {
                tracing::debug!("SUBMIT_BODY_IGNORED | reason={}", e);
                SubmitFields::default()
            }
        }
    } else {
        SubmitFields::default()
    }
}

/// Collect text parts of a multipart body. File parts are skipped.
async fn multipart_fields(mut multipart: Multipart) -> SubmitFields {
    let mut fields = SubmitFields::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("SUBMIT_MULTIPART_TRUNCATED | reason={}", e);
                break;
            }
        };
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.text().await {
            Ok(text) => fields.set(&name, text),
            Err(e) => {
                tracing::debug!("SUBMIT_MULTIPART_TRUNCATED | reason={}", e);
                break;
            }
        }
    }
    fields
}

async fn marine_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Html<String>, StagingError> {
    let rows = state
        .store
        .snapshot(&ctx.session_id)
        .ok_or(StagingError::StaleSession)?;
    Ok(Html(views::marine_page(&rows)))
}

async fn image_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], IMAGE)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.store.session_count(),
    })
}

// =============================================================================
// Utilities
// =============================================================================

fn redirect_to_root() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    // On Unix, listen for SIGINT and SIGTERM
    // On Windows, fall back to Ctrl+C only
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!("Failed to install signal handlers: {}", e);
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            return std::future::pending().await;
        }
        tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
    }
}
