use aquafarm_core::{MonitoringReading, PondId, ReadingId, Sensor, SensorId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use ordered_float::NotNan;
use ulid::Ulid;

use crate::registry::{CatalogRegistry, MonitoringRegistry};

use super::models::{
    AlertResponse, ListResponse, ReadingCreateRequest, ReadingListParams, ReadingRecordedResponse,
    ReadingResponse, SensorCreateRequest, SensorResponse,
};
use super::{error_response, parse_id, parse_timestamp, registry_error_response, success_response};

pub async fn create_sensor<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<SensorCreateRequest>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let sensor = Sensor {
        id: SensorId(Ulid::new()),
        name: payload.name.into(),
        unit: payload.unit.into(),
        description: payload.description.map(String::into_boxed_str),
    };

    match state.catalog.create_sensor(sensor.clone()).await {
        Ok(()) => success_response(
            StatusCode::CREATED,
            SensorResponse::from(sensor),
            Some("Sensor created successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to create sensor", e),
    }
}

pub async fn get_sensor<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let sensor_id = match parse_id(&id, "sensor") {
        Ok(id) => SensorId(id),
        Err(response) => return response,
    };

    match state.catalog.get_sensor(sensor_id).await {
        Ok(Some(sensor)) => success_response(StatusCode::OK, SensorResponse::from(sensor), None),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Sensor not found".to_string()),
        Err(e) => registry_error_response("Failed to get sensor", e),
    }
}

pub async fn list_sensors<C, S, M, U>(State(state): State<crate::AppState<C, S, M, U>>) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    match state.catalog.list_sensors().await {
        Ok(sensors) => {
            let items: Vec<SensorResponse> =
                sensors.into_iter().map(SensorResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list sensors", e),
    }
}

/// Persist a reading and return it together with any alerts it raised.
pub async fn record_reading<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<ReadingCreateRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let pond_id = match parse_id(&payload.pond_id, "pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };
    let sensor_id = match parse_id(&payload.sensor_id, "sensor") {
        Ok(id) => SensorId(id),
        Err(response) => return response,
    };
    let measured_at = match parse_timestamp(payload.measured_at.as_deref()) {
        Ok(ts) => ts,
        Err(response) => return response,
    };
    let value = match NotNan::new(payload.value) {
        Ok(value) => value,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Reading value must not be NaN".to_string(),
            );
        }
    };

    let reading = MonitoringReading {
        id: ReadingId(Ulid::new()),
        pond_id,
        sensor_id,
        value,
        measured_at,
    };

    match state.monitoring.record_reading(reading).await {
        Ok((reading, alerts)) => success_response(
            StatusCode::CREATED,
            ReadingRecordedResponse {
                reading: reading.into(),
                alerts: alerts.into_iter().map(AlertResponse::from).collect(),
            },
            Some("Reading recorded successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to record reading", e),
    }
}

pub async fn get_reading<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let reading_id = match parse_id(&id, "reading") {
        Ok(id) => ReadingId(id),
        Err(response) => return response,
    };

    match state.monitoring.get_reading(reading_id).await {
        Ok(Some(reading)) => {
            success_response(StatusCode::OK, ReadingResponse::from(reading), None)
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Reading not found".to_string()),
        Err(e) => registry_error_response("Failed to get reading", e),
    }
}

/// Readings for a pond, newest first. `?latest=true` keeps only the most
/// recent reading per sensor.
pub async fn list_readings<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<ReadingListParams>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let pond_id = match parse_id(&id, "pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };

    match state.monitoring.list_readings(pond_id, params.latest).await {
        Ok(readings) => {
            let items: Vec<ReadingResponse> =
                readings.into_iter().map(ReadingResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list readings", e),
    }
}
