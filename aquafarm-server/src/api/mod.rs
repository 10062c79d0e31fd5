pub mod alerts;
pub mod auth;
pub mod farms;
pub mod models;
pub mod monitoring;
pub mod species;
pub mod stocking;

use std::str::FromStr;

use aquafarm_core::{AlertState, DomainError, LifecycleState};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jiff::Timestamp;
use tower_http::cors::CorsLayer;
use ulid::Ulid;

use crate::AppState;
use crate::registry::{
    CatalogRegistry, MonitoringRegistry, RegistryError, StockingRegistry, UserRegistry,
};

use models::ApiResponse;

pub fn router<C, S, M, U>(state: AppState<C, S, M, U>) -> Router
where
    C: CatalogRegistry,
    S: StockingRegistry,
    M: MonitoringRegistry,
    U: UserRegistry,
{
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        // Catalog routes
        .route(
            "/species",
            get(species::list_species).post(species::create_species),
        )
        .route(
            "/species/{id}",
            get(species::get_species)
                .put(species::update_species)
                .delete(species::delete_species),
        )
        .route("/farms", get(farms::list_farms).post(farms::create_farm))
        .route(
            "/farms/{id}",
            get(farms::get_farm)
                .put(farms::update_farm)
                .delete(farms::delete_farm),
        )
        .route("/ponds", get(farms::list_ponds).post(farms::create_pond))
        .route("/ponds/{id}", get(farms::get_pond).delete(farms::delete_pond))
        .route("/ponds/{id}/readings", get(monitoring::list_readings))
        .route(
            "/sensors",
            get(monitoring::list_sensors).post(monitoring::create_sensor),
        )
        .route("/sensors/{id}", get(monitoring::get_sensor))
        // Stocking routes
        .route(
            "/batches",
            get(stocking::list_batches).post(stocking::create_batch),
        )
        .route("/batches/{id}", get(stocking::get_batch))
        .route("/batches/{id}/lifecycle", get(stocking::batch_lifecycle))
        .route("/lifecycles", get(stocking::list_lifecycles))
        .route("/lifecycles/{id}", get(stocking::get_lifecycle))
        .route(
            "/lifecycles/{id}/commercialize",
            post(stocking::commercialize),
        )
        .route("/lifecycles/{id}/cancel", post(stocking::cancel))
        .route("/lifecycles/{id}/metrics", get(stocking::lifecycle_metrics))
        .route("/inventory", get(stocking::list_inventory))
        .route("/inventory/add", post(stocking::add_quantity))
        .route("/inventory/reduce", post(stocking::reduce_quantity))
        .route(
            "/splits",
            get(stocking::list_splits).post(stocking::record_split),
        )
        .route("/splits/{id}/log", get(stocking::split_log))
        // Monitoring routes
        .route("/readings", post(monitoring::record_reading))
        .route("/readings/{id}", get(monitoring::get_reading))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/{id}", get(alerts::get_alert))
        .route("/alerts/{id}/resolve", post(alerts::resolve_alert))
        .route("/alerts/{id}/ignore", post(alerts::ignore_alert))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Response {
    success_response(StatusCode::OK, "ok", None)
}

// Helper to create error response
pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    let api_response = ApiResponse::<()> {
        success: false,
        data: None,
        message: Some(message),
    };
    (status, Json(api_response)).into_response()
}

// Helper to create success response
pub(crate) fn success_response<T: serde::Serialize>(
    status: StatusCode,
    data: T,
    message: Option<String>,
) -> Response {
    let api_response = ApiResponse {
        success: true,
        data: Some(data),
        message,
    };
    (status, Json(api_response)).into_response()
}

/// Map a registry failure to a status code. Domain rejections carry enough
/// structure to pick the right 4xx; everything else is a 500.
pub(crate) fn registry_error_response(context: &str, err: RegistryError) -> Response {
    let status = match &err {
        RegistryError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
        RegistryError::Domain(DomainError::DuplicateKey { .. }) => StatusCode::CONFLICT,
        RegistryError::Domain(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "{context}");
    }

    error_response(status, format!("{context}: {err}"))
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Ulid, Response> {
    Ulid::from_str(raw).map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid {what} ID format. Expected ULID."),
        )
    })
}

pub(crate) fn parse_timestamp(raw: Option<&str>) -> Result<Timestamp, Response> {
    match raw {
        None => Ok(Timestamp::now()),
        Some(raw) => Timestamp::from_str(raw).map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                "Invalid timestamp format. Expected RFC 3339.".to_string(),
            )
        }),
    }
}

pub(crate) fn parse_lifecycle_state(raw: &str) -> Result<LifecycleState, Response> {
    match raw {
        "PENDING" => Ok(LifecycleState::Pending),
        "COMMERCIALIZED" => Ok(LifecycleState::Commercialized),
        "CANCELLED" => Ok(LifecycleState::Cancelled),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown lifecycle state: {other}"),
        )),
    }
}

pub(crate) fn parse_alert_state(raw: &str) -> Result<AlertState, Response> {
    match raw {
        "ACTIVE" => Ok(AlertState::Active),
        "RESOLVED" => Ok(AlertState::Resolved),
        "IGNORED" => Ok(AlertState::Ignored),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown alert state: {other}"),
        )),
    }
}
