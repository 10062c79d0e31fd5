use aquafarm_core::{Farm, FarmId, Pond, PondId, UserId};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use ulid::Ulid;

use crate::auth::Claims;
use crate::registry::CatalogRegistry;

use super::models::{
    FarmCreateRequest, FarmListParams, FarmResponse, FarmUpdateRequest, ListResponse,
    PondCreateRequest, PondListParams, PondResponse,
};
use super::{error_response, parse_id, registry_error_response, success_response};

pub async fn list_farms<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<FarmListParams>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let owner = match params.owner.as_deref().map(|raw| parse_id(raw, "owner")) {
        Some(Ok(id)) => Some(UserId(id)),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.catalog.list_farms(owner).await {
        Ok(farms) => {
            let items: Vec<FarmResponse> = farms.into_iter().map(FarmResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list farms", e),
    }
}

pub async fn get_farm<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let farm_id = match parse_id(&id, "farm") {
        Ok(id) => FarmId(id),
        Err(response) => return response,
    };

    match state.catalog.get_farm(farm_id).await {
        Ok(Some(farm)) => success_response(StatusCode::OK, FarmResponse::from(farm), None),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Farm not found".to_string()),
        Err(e) => registry_error_response("Failed to get farm", e),
    }
}

// The authenticated caller becomes the farm's owner.
pub async fn create_farm<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<FarmCreateRequest>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let owner = match parse_id(&claims.sub, "user") {
        Ok(id) => UserId(id),
        Err(response) => return response,
    };

    let farm = Farm {
        id: FarmId(Ulid::new()),
        name: payload.name.into(),
        method: payload.method.into(),
        location: payload.location.into(),
        owner,
    };

    match state.catalog.create_farm(farm.clone()).await {
        Ok(()) => success_response(
            StatusCode::CREATED,
            FarmResponse::from(farm),
            Some("Farm created successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to create farm", e),
    }
}

pub async fn update_farm<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<FarmUpdateRequest>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let farm_id = match parse_id(&id, "farm") {
        Ok(id) => FarmId(id),
        Err(response) => return response,
    };

    match state.catalog.get_farm(farm_id).await {
        Ok(Some(existing)) => {
            let updated = Farm {
                name: payload.name.map(String::into_boxed_str).unwrap_or(existing.name),
                method: payload
                    .method
                    .map(String::into_boxed_str)
                    .unwrap_or(existing.method),
                location: payload
                    .location
                    .map(String::into_boxed_str)
                    .unwrap_or(existing.location),
                ..existing
            };

            match state.catalog.update_farm(farm_id, updated.clone()).await {
                Ok(()) => success_response(
                    StatusCode::OK,
                    FarmResponse::from(updated),
                    Some("Farm updated successfully".to_string()),
                ),
                Err(e) => registry_error_response("Failed to update farm", e),
            }
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Farm not found".to_string()),
        Err(e) => registry_error_response("Failed to get farm", e),
    }
}

pub async fn delete_farm<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let farm_id = match parse_id(&id, "farm") {
        Ok(id) => FarmId(id),
        Err(response) => return response,
    };

    match state.catalog.delete_farm(farm_id).await {
        Ok(()) => success_response(
            StatusCode::OK,
            (),
            Some("Farm deleted successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to delete farm", e),
    }
}

pub async fn list_ponds<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Query(params): Query<PondListParams>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let farm = match params.farm.as_deref().map(|raw| parse_id(raw, "farm")) {
        Some(Ok(id)) => Some(FarmId(id)),
        Some(Err(response)) => return response,
        None => None,
    };

    match state.catalog.list_ponds(farm).await {
        Ok(ponds) => {
            let items: Vec<PondResponse> = ponds.into_iter().map(PondResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list ponds", e),
    }
}

pub async fn get_pond<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let pond_id = match parse_id(&id, "pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };

    match state.catalog.get_pond(pond_id).await {
        Ok(Some(pond)) => success_response(StatusCode::OK, PondResponse::from(pond), None),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Pond not found".to_string()),
        Err(e) => registry_error_response("Failed to get pond", e),
    }
}

pub async fn create_pond<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<PondCreateRequest>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let farm_id = match parse_id(&payload.farm_id, "farm") {
        Ok(id) => FarmId(id),
        Err(response) => return response,
    };

    let pond = Pond {
        id: PondId(Ulid::new()),
        farm_id,
        kind: payload.kind.into(),
        volume_liters: payload.volume_liters,
        capacity_liters: payload.capacity_liters,
    };

    match state.catalog.create_pond(pond.clone()).await {
        Ok(()) => success_response(
            StatusCode::CREATED,
            PondResponse::from(pond),
            Some("Pond created successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to create pond", e),
    }
}

pub async fn delete_pond<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let pond_id = match parse_id(&id, "pond") {
        Ok(id) => PondId(id),
        Err(response) => return response,
    };

    match state.catalog.delete_pond(pond_id).await {
        Ok(()) => success_response(
            StatusCode::OK,
            (),
            Some("Pond deleted successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to delete pond", e),
    }
}
