use super::{ApiError, AppState, GatewayResponse};
use crate::env::{EnvMap, EnvStore};
use crate::error::{GatewayError, GatewayResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct UpdateEnvVariableRequest {
    pub variable_name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkEnvUpdateRequest {
    pub variables: HashMap<String, String>,
}

/// Env file access blocks on disk and on the write lock, so it runs off the
/// async workers.
async fn with_store<T, F>(state: &Arc<AppState>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&EnvStore) -> GatewayResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || op(&state.env))
        .await
        .map_err(|e| GatewayError::Other(anyhow::Error::new(e)))?
        .map_err(ApiError::from)
}

fn variables(env: &EnvMap) -> serde_json::Value {
    json!({ "variables": env })
}

pub async fn list_env(State(state): State<Arc<AppState>>) -> Result<Json<GatewayResponse>, ApiError> {
    let env = with_store(&state, |store| store.read()).await?;
    Ok(Json(GatewayResponse::ok(
        format!("{} variable(s)", env.len()),
        variables(&env),
    )))
}

pub async fn set_env(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateEnvVariableRequest>, JsonRejection>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| GatewayError::validation(r.body_text()))?;
    let name = req.variable_name.clone();
    let env = with_store(&state, move |store| store.set(&req.variable_name, &req.value)).await?;
    Ok(Json(GatewayResponse::ok(format!("Set {}", name), variables(&env))))
}

pub async fn delete_env(
    State(state): State<Arc<AppState>>,
    Path(variable_name): Path<String>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let name = variable_name.clone();
    let env = with_store(&state, move |store| store.delete(&variable_name)).await?;
    Ok(Json(GatewayResponse::ok(format!("Deleted {}", name), variables(&env))))
}

pub async fn bulk_set_env(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BulkEnvUpdateRequest>, JsonRejection>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| GatewayError::validation(r.body_text()))?;
    let count = req.variables.len();
    let env = with_store(&state, move |store| store.bulk_set(&req.variables)).await?;
    Ok(Json(GatewayResponse::ok(
        format!("Set {} variable(s)", count),
        variables(&env),
    )))
}
