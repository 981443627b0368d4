use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

use super::service::SimulationService;
use super::store::{ScenarioRepository, ScenarioStore, StoreError};
use super::wire::{SaveScenarioRequest, SimulateRequest};

/// Router builder exposing the simulation store over HTTP. Contract-level
/// refusals (unknown scenario, duplicate name) answer 200 with an error
/// envelope so clients branch on `status`; only transport failures surface
/// as HTTP errors.
pub fn simulation_router<R>(service: Arc<SimulationService<R>>) -> Router
where
    R: ScenarioRepository + 'static,
{
    Router::new()
        .route("/simulate", post(simulate_handler::<R>))
        .route("/simulation/save", post(save_handler::<R>))
        .route("/simulation/scenarios", get(list_handler::<R>))
        .route("/simulation/load/:name", get(load_handler::<R>))
        .route("/simulation/delete/:name", delete(delete_handler::<R>))
        .route("/simulation/preset/:name", get(preset_handler::<R>))
        .with_state(service)
}

fn unavailable(err: StoreError) -> Response {
    let payload = json!({
        "status": "error",
        "message": err.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}

pub(crate) async fn simulate_handler<R>(
    State(service): State<Arc<SimulationService<R>>>,
    axum::Json(request): axum::Json<SimulateRequest>,
) -> Response
where
    R: ScenarioRepository + 'static,
{
    match ScenarioStore::simulate(service.as_ref(), &request) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(err) => unavailable(err),
    }
}

pub(crate) async fn save_handler<R>(
    State(service): State<Arc<SimulationService<R>>>,
    axum::Json(request): axum::Json<SaveScenarioRequest>,
) -> Response
where
    R: ScenarioRepository + 'static,
{
    match ScenarioStore::save(service.as_ref(), &request) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(err) => unavailable(err),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<SimulationService<R>>>,
) -> Response
where
    R: ScenarioRepository + 'static,
{
    match service.scenario_names() {
        Ok(names) => {
            let payload = json!({
                "status": "success",
                "scenarios": names,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => unavailable(StoreError::Unavailable(err.to_string())),
    }
}

pub(crate) async fn load_handler<R>(
    State(service): State<Arc<SimulationService<R>>>,
    Path(name): Path<String>,
) -> Response
where
    R: ScenarioRepository + 'static,
{
    match ScenarioStore::load(service.as_ref(), &name) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(err) => unavailable(err),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<SimulationService<R>>>,
    Path(name): Path<String>,
) -> Response
where
    R: ScenarioRepository + 'static,
{
    match ScenarioStore::delete(service.as_ref(), &name) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(err) => unavailable(err),
    }
}

pub(crate) async fn preset_handler<R>(
    State(service): State<Arc<SimulationService<R>>>,
    Path(name): Path<String>,
) -> Response
where
    R: ScenarioRepository + 'static,
{
    match ScenarioStore::preset(service.as_ref(), &name) {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(err) => unavailable(err),
    }
}
