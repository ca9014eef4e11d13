// ============================================================
// Layer 1 — Web Routes
// ============================================================
//   GET  /               → empty page
//   POST /analyze        → page with tokens, predictions, download link
//   POST /clear          → reset log, page with confirmation
//   GET  /log            → current log as a CSV attachment
//   POST /api/analyze    → AnalysisOutcome as JSON
//   GET  /api/log        → Vec<LogRecord> as JSON
//   POST /api/log/clear  → 204
//
// Every handler runs the use case on the blocking pool while
// holding the AppState mutex.

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::{Arc, PoisonError};
use tracing::{error, info};

use crate::application::analyze_use_case::{AnalysisOutcome, AnalyzeUseCase};
use crate::domain::{
    errors::{AnalyzeError, LogError},
    log_record::LogRecord,
};
use crate::web::page::{self, Notice};
use crate::web::AppState;

type AppStateArc = Arc<AppState>;

const EMPTY_INPUT_WARNING: &str = "⚠️ Please enter some text.";
const CLEARED_MESSAGE: &str = "Interaction log cleared!";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
}

/// Run `f` against the use case on the blocking pool. The mutex makes
/// every action run to completion before the next one starts.
async fn with_use_case<T, F>(state: &AppStateArc, f: F) -> Result<T, (StatusCode, String)>
where
    F: FnOnce(&AnalyzeUseCase) -> T + Send + 'static,
    T: Send + 'static,
{
    let use_case = Arc::clone(&state.use_case);
    tokio::task::spawn_blocking(move || {
        let guard = use_case.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    })
    .await
    .map_err(|e| {
        error!("Worker task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

// ============================================================================
// HTML Routes
// ============================================================================

pub fn page_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_form))
        .route("/clear", post(clear_form))
        .route("/log", get(download_log))
}

async fn index() -> Html<String> {
    Html(page::render("", &[], None))
}

async fn analyze_form(
    State(state): State<AppStateArc>,
    Form(req): Form<AnalyzeRequest>,
) -> Response {
    let text = req.text.clone();
    let result = match with_use_case(&state, move |uc| uc.analyze(&text)).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match result {
        Ok(outcome) => {
            let notices: Vec<Notice> = outcome.log_error.iter().cloned().map(Notice::Error).collect();
            Html(page::render(&req.text, &notices, Some(&outcome))).into_response()
        }
        Err(AnalyzeError::EmptyInput) => {
            let notices = [Notice::Warning(EMPTY_INPUT_WARNING.to_string())];
            Html(page::render(&req.text, &notices, None)).into_response()
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            let notices = [Notice::Error(e.to_string())];
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page::render(&req.text, &notices, None)))
                .into_response()
        }
    }
}

async fn clear_form(State(state): State<AppStateArc>) -> Response {
    let result = match with_use_case(&state, |uc| uc.clear_log()).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    let notice = match result {
        Ok(()) => Notice::Success(CLEARED_MESSAGE.to_string()),
        Err(e) => {
            error!("Log clearing error: {}", e);
            Notice::Error(format!("Log clearing error: {e}"))
        }
    };
    Html(page::render("", &[notice], None)).into_response()
}

async fn download_log(State(state): State<AppStateArc>) -> Response {
    let result = match with_use_case(&state, |uc| {
        uc.read_log().map(|content| (uc.log().file_name(), content))
    })
    .await
    {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match result {
        Ok((file_name, content)) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
            ],
            content,
        )
            .into_response(),
        Err(e) => log_error_response(e).into_response(),
    }
}

// ============================================================================
// JSON API Routes
// ============================================================================

pub fn api_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/analyze", post(api_analyze))
        .route("/api/log", get(api_log))
        .route("/api/log/clear", post(api_clear_log))
}

async fn api_analyze(
    State(state): State<AppStateArc>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisOutcome>, (StatusCode, String)> {
    let outcome = with_use_case(&state, move |uc| uc.analyze(&req.text))
        .await?
        .map_err(|e| match e {
            AnalyzeError::EmptyInput => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AnalyzeError::Inference(_) => {
                error!("Analysis failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        })?;

    info!("Analysis returned {} predictions", outcome.predictions.len());
    Ok(Json(outcome))
}

async fn api_log(
    State(state): State<AppStateArc>,
) -> Result<Json<Vec<LogRecord>>, (StatusCode, String)> {
    let records = with_use_case(&state, |uc| uc.log_records())
        .await?
        .map_err(log_error_response)?;
    Ok(Json(records))
}

async fn api_clear_log(State(state): State<AppStateArc>) -> Result<StatusCode, (StatusCode, String)> {
    with_use_case(&state, |uc| uc.clear_log())
        .await?
        .map_err(log_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

fn log_error_response(e: LogError) -> (StatusCode, String) {
    match e {
        LogError::Missing(_) => (StatusCode::NOT_FOUND, e.to_string()),
        _ => {
            error!("Interaction log error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
