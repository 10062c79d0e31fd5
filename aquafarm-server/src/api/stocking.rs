use aquafarm_core::{
    BatchId, FarmId, LifecycleId, PondId, PondSplit, SpeciesId, SplitId, StockingBatch,
    lifecycle::CommercializeRequest,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use ulid::Ulid;

use crate::registry::StockingRegistry;

use super::models::{
    BatchCreateRequest, BatchListParams, BatchResponse, CommercializeRequestBody,
    InventoryAdjustRequest, InventoryListParams, InventoryResponse, LifecycleListParams,
    LifecycleMetricsResponse, LifecycleResponse, ListResponse, SplitCreateRequest,
    SplitListParams, SplitLogResponse, SplitRecordedResponse, SplitResponse,
    StockingCreatedResponse,
};
use super::{
    error_response, parse_id, parse_lifecycle_state, parse_timestamp, registry_error_response,
    success_response,
};

pub async fn create_batch<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<BatchCreateRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let species_id = match parse_id(&payload.species_id, "species") {
        Ok(id) => SpeciesId(id),
        Err(response) => return response,
    };
    let pond_id = match parse_id(&payload.pond_id, "pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };
    let stocked_at = match parse_timestamp(payload.stocked_at.as_deref()) {
        Ok(ts) => ts,
        Err(response) => return response,
    };

    if payload.quantity <= 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Batch quantity must be positive".to_string(),
        );
    }

    let batch = StockingBatch {
        id: BatchId(Ulid::new()),
        species_id,
        pond_id,
        quantity: payload.quantity,
        stocked_at,
        investment: payload.investment,
    };

    match state.stocking.create_batch(batch).await {
        Ok(created) => success_response(
            StatusCode::CREATED,
            StockingCreatedResponse {
                batch: created.batch.into(),
                lifecycle: created.lifecycle.into(),
                inventory: created.inventory.into(),
            },
            Some("Stocking batch created successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to create stocking batch", e),
    }
}

pub async fn list_batches<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<BatchListParams>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let pond = match params.pond.as_deref().map(|raw| parse_id(raw, "pond")) {
        Some(Ok(id)) => Some(PondId(id)),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.stocking.list_batches(pond).await {
        Ok(batches) => {
            let items: Vec<BatchResponse> =
                batches.into_iter().map(BatchResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list stocking batches", e),
    }
}

pub async fn get_batch<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let batch_id = match parse_id(&id, "batch") {
        Ok(id) => BatchId(id),
        Err(response) => return response,
    };

    match state.stocking.get_batch(batch_id).await {
        Ok(Some(batch)) => success_response(StatusCode::OK, BatchResponse::from(batch), None),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Batch not found".to_string()),
        Err(e) => registry_error_response("Failed to get batch", e),
    }
}

pub async fn batch_lifecycle<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let batch_id = match parse_id(&id, "batch") {
        Ok(id) => BatchId(id),
        Err(response) => return response,
    };

    match state.stocking.lifecycle_for_batch(batch_id).await {
        Ok(Some(lifecycle)) => {
            success_response(StatusCode::OK, LifecycleResponse::from(lifecycle), None)
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Lifecycle not found".to_string()),
        Err(e) => registry_error_response("Failed to get lifecycle", e),
    }
}

pub async fn list_lifecycles<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<LifecycleListParams>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let lifecycle_state = match params.state.as_deref().map(parse_lifecycle_state) {
        Some(Ok(s)) => Some(s),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.stocking.list_lifecycles(lifecycle_state).await {
        Ok(lifecycles) => {
            let items: Vec<LifecycleResponse> =
                lifecycles.into_iter().map(LifecycleResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list lifecycles", e),
    }
}

pub async fn get_lifecycle<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let lifecycle_id = match parse_id(&id, "lifecycle") {
        Ok(id) => LifecycleId(id),
        Err(response) => return response,
    };

    match state.stocking.get_lifecycle(lifecycle_id).await {
        Ok(Some(lifecycle)) => {
            success_response(StatusCode::OK, LifecycleResponse::from(lifecycle), None)
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Lifecycle not found".to_string()),
        Err(e) => registry_error_response("Failed to get lifecycle", e),
    }
}

pub async fn commercialize<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<CommercializeRequestBody>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let lifecycle_id = match parse_id(&id, "lifecycle") {
        Ok(id) => LifecycleId(id),
        Err(response) => return response,
    };
    let commercialized_at = match payload
        .commercialized_at
        .as_deref()
        .map(|raw| parse_timestamp(Some(raw)))
    {
        Some(Ok(ts)) => Some(ts),
        Some(Err(response)) => return response,
        None => None,
    };

    let request = CommercializeRequest {
        commercialized_at,
        kilos_sold: payload.kilos_sold,
        price_per_kilo: payload.price_per_kilo,
        avg_kilos_per_fish: payload.avg_kilos_per_fish,
        total_harvest_kilos: payload.total_harvest_kilos,
    };

    match state.stocking.commercialize(lifecycle_id, request).await {
        Ok(lifecycle) => success_response(
            StatusCode::OK,
            LifecycleResponse::from(lifecycle),
            Some("Batch commercialized successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to commercialize batch", e),
    }
}

pub async fn cancel<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let lifecycle_id = match parse_id(&id, "lifecycle") {
        Ok(id) => LifecycleId(id),
        Err(response) => return response,
    };

    match state.stocking.cancel(lifecycle_id).await {
        Ok(lifecycle) => success_response(
            StatusCode::OK,
            LifecycleResponse::from(lifecycle),
            Some("Batch cancelled successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to cancel batch", e),
    }
}

pub async fn lifecycle_metrics<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let lifecycle_id = match parse_id(&id, "lifecycle") {
        Ok(id) => LifecycleId(id),
        Err(response) => return response,
    };

    let lifecycle = match state.stocking.get_lifecycle(lifecycle_id).await {
        Ok(Some(lifecycle)) => lifecycle,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Lifecycle not found".to_string());
        }
        Err(e) => return registry_error_response("Failed to get lifecycle", e),
    };

    let batch = match state.stocking.get_batch(lifecycle.batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Batch not found".to_string()),
        Err(e) => return registry_error_response("Failed to get batch", e),
    };

    let metrics = LifecycleMetricsResponse {
        state: lifecycle.state.as_str().to_string(),
        total_revenue: lifecycle.total_revenue(),
        profitability_pct: lifecycle.profitability_pct(batch.investment),
        survival_pct: lifecycle.survival_pct(),
        mortality_rate: lifecycle.mortality_rate,
        cultivation_days: lifecycle.cultivation_days(batch.stocked_at),
    };

    success_response(StatusCode::OK, metrics, None)
}

pub async fn list_inventory<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<InventoryListParams>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let farm = match params.farm.as_deref().map(|raw| parse_id(raw, "farm")) {
        Some(Ok(id)) => Some(FarmId(id)),
        Some(Err(response)) => return response,
        None => None,
    };
    let species = match params.species.as_deref().map(|raw| parse_id(raw, "species")) {
        Some(Ok(id)) => Some(SpeciesId(id)),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.stocking.list_inventory(farm, species).await {
        Ok(records) => {
            let items: Vec<InventoryResponse> =
                records.into_iter().map(InventoryResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list inventory", e),
    }
}

pub async fn add_quantity<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let (species, farm) = match parse_adjust_ids(&payload) {
        Ok(ids) => ids,
        Err(response) => return response,
    };
    if payload.quantity <= 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Adjustment quantity must be positive".to_string(),
        );
    }

    match state.stocking.add_quantity(species, farm, payload.quantity).await {
        Ok(record) => success_response(
            StatusCode::OK,
            InventoryResponse::from(record),
            Some("Inventory increased successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to increase inventory", e),
    }
}

pub async fn reduce_quantity<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let (species, farm) = match parse_adjust_ids(&payload) {
        Ok(ids) => ids,
        Err(response) => return response,
    };
    if payload.quantity <= 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Adjustment quantity must be positive".to_string(),
        );
    }

    match state
        .stocking
        .reduce_quantity(species, farm, payload.quantity)
        .await
    {
        Ok(record) => success_response(
            StatusCode::OK,
            InventoryResponse::from(record),
            Some("Inventory reduced successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to reduce inventory", e),
    }
}

fn parse_adjust_ids(payload: &InventoryAdjustRequest) -> Result<(SpeciesId, FarmId), Response> {
    let species = SpeciesId(parse_id(&payload.species_id, "species")?);
    let farm = FarmId(parse_id(&payload.farm_id, "farm")?);
    Ok((species, farm))
}

pub async fn record_split<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<SplitCreateRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let batch_id = match parse_id(&payload.batch_id, "batch") {
        Ok(id) => BatchId(id),
        Err(response) => return response,
    };
    let source_pond_id = match parse_id(&payload.source_pond_id, "source pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };
    let target_pond_id = match parse_id(&payload.target_pond_id, "target pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };
    let occurred_at = match parse_timestamp(payload.occurred_at.as_deref()) {
        Ok(ts) => ts,
        Err(response) => return response,
    };

    if source_pond_id == target_pond_id {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Source and target pond must differ".to_string(),
        );
    }

    let split = PondSplit {
        id: SplitId(Ulid::new()),
        batch_id,
        source_pond_id,
        target_pond_id,
        occurred_at,
    };

    match state.stocking.record_split(split).await {
        Ok((split, entry)) => success_response(
            StatusCode::CREATED,
            SplitRecordedResponse {
                split: split.into(),
                log_entry: entry.into(),
            },
            Some("Pond split recorded successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to record pond split", e),
    }
}

pub async fn list_splits<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<SplitListParams>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let pond = match params.pond.as_deref().map(|raw| parse_id(raw, "pond")) {
        Some(Ok(id)) => Some(PondId(id)),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.stocking.list_splits(pond).await {
        Ok(splits) => {
            let items: Vec<SplitResponse> =
                splits.into_iter().map(SplitResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list pond splits", e),
    }
}

pub async fn split_log<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: StockingRegistry,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let split_id = match parse_id(&id, "split") {
        Ok(id) => SplitId(id),
        Err(response) => return response,
    };

    match state.stocking.split_log(split_id).await {
        Ok(entries) => {
            let items: Vec<SplitLogResponse> =
                entries.into_iter().map(SplitLogResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to get split log", e),
    }
}
