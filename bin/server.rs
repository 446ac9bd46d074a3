// Expense Tracker - Web Server
// REST API with Axum over the same command interface as the CLI and TUI

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use chrono::Local;
use clap::Parser;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use expense_tracker::tracker::{AssumeYes, ExpenseTracker, Submission, DELETE_PROMPT};
use expense_tracker::{
    export_csv, export_file_name, export_json, logging, sum_amounts, CategoryFilter, Config,
    Expense, ExpenseCandidate, ExpenseId, ExportFormat, GlobalArgs, KeyValueStore,
};

type Tracker = ExpenseTracker<Box<dyn KeyValueStore>>;

#[derive(Parser, Debug)]
#[command(name = "expense-server", version, about = "HTTP API for the expense log")]
struct ServerArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Bind address (overrides config file)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    tracker: Arc<Mutex<Tracker>>,
}

impl AppState {
    fn new(tracker: Tracker) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Lock the tracker, ignoring poisoning.
    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize, Default)]
struct CategoryQuery {
    category: Option<String>,
}

impl CategoryQuery {
    fn filter(&self) -> CategoryFilter {
        CategoryFilter::from(self.category.as_deref())
    }
}

#[derive(Deserialize, Default)]
struct DeleteQuery {
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize, Default)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
}

#[derive(Serialize)]
struct ExpenseList {
    expenses: Vec<Expense>,
    count: usize,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    total: Decimal,
}

#[derive(Serialize)]
struct TotalResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    total: Decimal,
}

#[derive(Serialize)]
struct CategoryTotal {
    category: String,
    count: usize,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    total: Decimal,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses?category= - Expenses, newest date first
async fn list_expenses(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> impl IntoResponse {
    let tracker = state.tracker();
    let expenses: Vec<Expense> = tracker.view(&query.filter()).into_iter().cloned().collect();
    let total = sum_amounts(expenses.iter().map(|e| e.amount()));

    Json(ApiResponse::ok(ExpenseList {
        count: expenses.len(),
        expenses,
        total,
    }))
}

/// POST /api/expenses - Validate and record a new expense
async fn add_expense(State(state): State<AppState>, Json(candidate): Json<ExpenseCandidate>) -> Response {
    let submission = state.tracker().submit_expense(&candidate);

    match submission {
        Submission::Added { expense, notice } if notice.is_success() => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(expense).with_message(notice.message)),
        )
            .into_response(),
        Submission::Added { expense, notice } => {
            error!(id = %expense.id(), "expense added but not saved");
            let mut body = ApiResponse::ok(expense);
            body.success = false;
            body.error = Some(notice.message);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
        Submission::Rejected { notice, .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::err(notice.message))).into_response()
        }
    }
}

/// DELETE /api/expenses/:id?confirm=true - Remove an expense
async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    if !query.confirm {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err(format!("{} Repeat with ?confirm=true.", DELETE_PROMPT))),
        )
            .into_response();
    }

    let notice = state.tracker().request_delete(&ExpenseId::from(id), &mut AssumeYes);
    match notice {
        Some(notice) if notice.is_success() => {
            Json(ApiResponse::ok(()).with_message(notice.message)).into_response()
        }
        Some(notice) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::err(notice.message))).into_response()
        }
        None => (StatusCode::BAD_REQUEST, Json(ApiResponse::err("Delete declined"))).into_response(),
    }
}

/// GET /api/total?category= - Running total
async fn get_total(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> impl IntoResponse {
    let tracker = state.tracker();
    let response = match query.filter() {
        CategoryFilter::All => TotalResponse {
            category: None,
            total: tracker.total(),
        },
        CategoryFilter::Category(c) => TotalResponse {
            total: tracker.store().total_by_category(&c),
            category: Some(c),
        },
    };
    Json(ApiResponse::ok(response))
}

/// GET /api/categories - Totals per category, largest first
async fn get_categories(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = state.tracker();
    let totals: Vec<CategoryTotal> = tracker
        .category_totals()
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            count: tracker.store().by_category(&category).len(),
            category,
            total,
        })
        .collect();
    Json(ApiResponse::ok(totals))
}

/// GET /api/export?format=json|csv - Download every expense
async fn export_expenses(State(state): State<AppState>, Query(query): Query<ExportQuery>) -> Response {
    let tracker = state.tracker();
    let file_name = export_file_name(query.format, Local::now().date_naive());

    let rendered = match query.format {
        ExportFormat::Json => export_json(tracker.expenses()).map(|json| (json.into_bytes(), "application/json")),
        ExportFormat::Csv => {
            let mut out = Vec::new();
            export_csv(tracker.expenses(), &mut out).map(|_| (out, "text/csv"))
        }
    };

    match rendered {
        Ok((body, content_type)) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::err(e.to_string()))).into_response()
        }
    }
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(list_expenses).post(add_expense))
        .route("/expenses/:id", delete(delete_expense))
        .route("/total", get(get_total))
        .route("/categories", get(get_categories))
        .route("/export", get(export_expenses))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    let (mut config, config_warning) = Config::load(&args.global);
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    logging::init(&config.logging, None)?;
    if let Some(warning) = config_warning {
        warn!("{}", warning);
    }

    let backend = config
        .storage
        .open_backend()
        .context("Failed to open expense storage")?;
    info!(backend = %backend.describe(), key = %config.storage.key, "storage opened");

    let mut tracker = ExpenseTracker::open(backend, config.storage.key.clone());
    for notice in tracker.take_notices() {
        warn!("{}", notice);
    }
    info!(count = tracker.expenses().len(), "expenses loaded");

    let addr = config.listen_addr().context("Invalid server host/port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("🚀 Expense API running on http://{}", addr);
    println!("   Try: http://{}/api/expenses", addr);
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app(AppState::new(tracker)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
