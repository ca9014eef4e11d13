// ============================================================
// Layer 1 — Web Presentation
// ============================================================
// One HTML page (form, results, download link, clear button)
// plus a small JSON API over the same AnalyzeUseCase.
//
//   page.rs    — HTML rendering, escaping
//   routes.rs  — axum handlers for both surfaces

pub mod page;
pub mod routes;

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::analyze_use_case::AnalyzeUseCase;

/// Default bind address for `serve`
pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Application state shared across handlers
pub struct AppState {
    /// Single owner of the model and the interaction log. Handlers lock
    /// it for the whole action, so the log has one writer at a time.
    pub use_case: Arc<Mutex<AnalyzeUseCase>>,
}

impl AppState {
    pub fn new(use_case: AnalyzeUseCase) -> Self {
        Self { use_case: Arc::new(Mutex::new(use_case)) }
    }
}

/// Build the full router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .merge(routes::api_routes())
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
