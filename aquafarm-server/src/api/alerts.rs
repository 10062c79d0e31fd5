use aquafarm_core::{AlertId, PondId};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};

use crate::registry::MonitoringRegistry;

use super::models::{AlertListParams, AlertResponse, ListResponse};
use super::{error_response, parse_alert_state, parse_id, registry_error_response, success_response};

pub async fn list_alerts<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<AlertListParams>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let pond = match params.pond.as_deref().map(|raw| parse_id(raw, "pond")) {
        Some(Ok(id)) => Some(PondId(id)),
        Some(Err(response)) => return response,
        None => None,
    };
    let alert_state = match params.state.as_deref().map(parse_alert_state) {
        Some(Ok(s)) => Some(s),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.monitoring.list_alerts(pond, alert_state).await {
        Ok(alerts) => {
            let items: Vec<AlertResponse> =
                alerts.into_iter().map(AlertResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list alerts", e),
    }
}

pub async fn get_alert<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let alert_id = match parse_id(&id, "alert") {
        Ok(id) => AlertId(id),
        Err(response) => return response,
    };

    match state.monitoring.get_alert(alert_id).await {
        Ok(Some(alert)) => success_response(StatusCode::OK, AlertResponse::from(alert), None),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Alert not found".to_string()),
        Err(e) => registry_error_response("Failed to get alert", e),
    }
}

pub async fn resolve_alert<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let alert_id = match parse_id(&id, "alert") {
        Ok(id) => AlertId(id),
        Err(response) => return response,
    };

    match state.monitoring.resolve_alert(alert_id).await {
        Ok(alert) => success_response(
            StatusCode::OK,
            AlertResponse::from(alert),
            Some("Alert resolved successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to resolve alert", e),
    }
}

pub async fn ignore_alert<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: MonitoringRegistry,
    U: Clone + Send + Sync + 'static,
{
    let alert_id = match parse_id(&id, "alert") {
        Ok(id) => AlertId(id),
        Err(response) => return response,
    };

    match state.monitoring.ignore_alert(alert_id).await {
        Ok(alert) => success_response(
            StatusCode::OK,
            AlertResponse::from(alert),
            Some("Alert ignored successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to ignore alert", e),
    }
}
