use aquafarm_core::{Species, SpeciesId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use ulid::Ulid;

use crate::registry::CatalogRegistry;

use super::models::{ListResponse, SpeciesCreateRequest, SpeciesResponse};
use super::{error_response, parse_id, registry_error_response, success_response};

fn species_from_request(id: SpeciesId, payload: SpeciesCreateRequest) -> Species {
    Species {
        id,
        name: payload.name.into(),
        scientific_name: payload.scientific_name.map(String::into_boxed_str),
        tolerance: payload.tolerance,
        nutrition: payload.nutrition,
        growth: payload.growth,
        reproduction: payload.reproduction,
        habitat: payload.habitat.map(String::into_boxed_str),
        diet: payload.diet.map(String::into_boxed_str),
        behavior: payload.behavior.map(String::into_boxed_str),
        stocking_density: payload.stocking_density.map(String::into_boxed_str),
    }
}

pub async fn list_species<C, S, M, U>(State(state): State<crate::AppState<C, S, M, U>>) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    match state.catalog.list_species().await {
        Ok(species) => {
            let items: Vec<SpeciesResponse> =
                species.into_iter().map(SpeciesResponse::from).collect();
            success_response(StatusCode::OK, ListResponse::new(items), None)
        }
        Err(e) => registry_error_response("Failed to list species", e),
    }
}

pub async fn get_species<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let species_id = match parse_id(&id, "species") {
        Ok(id) => SpeciesId(id),
        Err(response) => return response,
    };

    match state.catalog.get_species(species_id).await {
        Ok(Some(species)) => {
            success_response(StatusCode::OK, SpeciesResponse::from(species), None)
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Species not found".to_string()),
        Err(e) => registry_error_response("Failed to get species", e),
    }
}

pub async fn create_species<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<SpeciesCreateRequest>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let species = species_from_request(SpeciesId(Ulid::new()), payload);

    match state.catalog.create_species(species.clone()).await {
        Ok(()) => success_response(
            StatusCode::CREATED,
            SpeciesResponse::from(species),
            Some("Species created successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to create species", e),
    }
}

pub async fn update_species<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<SpeciesCreateRequest>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let species_id = match parse_id(&id, "species") {
        Ok(id) => SpeciesId(id),
        Err(response) => return response,
    };

    let species = species_from_request(species_id, payload);

    match state.catalog.update_species(species_id, species.clone()).await {
        Ok(()) => success_response(
            StatusCode::OK,
            SpeciesResponse::from(species),
            Some("Species updated successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to update species", e),
    }
}

pub async fn delete_species<C, S, M, U>(
    Path(id): Path<String>,
    State(state): State<crate::AppState<C, S, M, U>>,
) -> Response
where
    C: CatalogRegistry,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let species_id = match parse_id(&id, "species") {
        Ok(id) => SpeciesId(id),
        Err(response) => return response,
    };

    match state.catalog.delete_species(species_id).await {
        Ok(()) => success_response(
            StatusCode::OK,
            (),
            Some("Species deleted successfully".to_string()),
        ),
        Err(e) => registry_error_response("Failed to delete species", e),
    }
}
