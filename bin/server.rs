// Fleet Trip Import - Web Server
// REST API with Axum for the bulk import modal

use anyhow::{anyhow, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use env_logger::Env;
use fleet_trip_import::{
    CommitOutcome, ImportConfig, ImportPreviewReport, ImportSession, ReferenceData,
    SqliteTripStore, StoredTrip, TripStore,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<SqliteTripStore>>,
    reference: Arc<ReferenceData>,
    actor: String,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }

    fn fail(status: StatusCode, error: &anyhow::Error) -> Response {
        (
            status,
            Json(ApiResponse::<T> {
                success: false,
                data: None,
                error: Some(format!("{:#}", error)),
            }),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
struct PreviewRequest {
    text: String,
    #[serde(default)]
    has_header: bool,
}

#[derive(Deserialize)]
struct CommitRequest {
    text: String,
    #[serde(default)]
    has_header: bool,
    departure_date: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// POST /api/import/preview - Classify pasted rows, nothing is written
async fn preview_import(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Response {
    let session = ImportSession::new((*state.reference).clone(), &request.text, request.has_header);
    ApiResponse::<ImportPreviewReport>::ok(session.preview().clone())
}

/// POST /api/import/commit - Recompute the preview and persist it
async fn commit_import(
    State(state): State<AppState>,
    Json(request): Json<CommitRequest>,
) -> Response {
    let session = ImportSession::new((*state.reference).clone(), &request.text, request.has_header);

    let result = lock_store(&state).and_then(|mut store| {
        session.commit(&mut *store, &request.departure_date, &state.actor)
    });

    match result {
        Ok(outcome) => ApiResponse::<CommitOutcome>::ok(outcome),
        Err(e) => {
            error!("Import failed: {:#}", e);
            ApiResponse::<CommitOutcome>::fail(StatusCode::UNPROCESSABLE_ENTITY, &e)
        }
    }
}

/// GET /api/trips - All stored trips
async fn list_trips(State(state): State<AppState>) -> Response {
    match lock_store(&state).and_then(|store| store.list_trips()) {
        Ok(trips) => ApiResponse::<Vec<StoredTrip>>::ok(trips),
        Err(e) => {
            error!("Error listing trips: {:#}", e);
            ApiResponse::<Vec<StoredTrip>>::fail(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

fn lock_store(state: &AppState) -> Result<std::sync::MutexGuard<'_, SqliteTripStore>> {
    state
        .store
        .lock()
        .map_err(|_| anyhow!("trip store lock poisoned"))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = ImportConfig::load()?;
    let reference = ReferenceData::load(&config.vehicles_path, &config.drivers_path, &config.rules_path)?;
    let store = SqliteTripStore::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path.display());

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        reference: Arc::new(reference),
        actor: config.actor.clone(),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/import/preview", post(preview_import))
        .route("/import/commit", post(commit_import))
        .route("/trips", get(list_trips))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    info!("Server running on http://{}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
