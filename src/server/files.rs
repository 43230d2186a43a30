use super::{ApiError, AppState, GatewayResponse};
use crate::error::GatewayError;
use crate::files::path::{file_name, validate_path};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub path: Option<String>,
    pub depth: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub path: String,
}

pub async fn file_tree(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TreeQuery>, QueryRejection>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let Query(query) = query.map_err(|r| GatewayError::validation(r.body_text()))?;
    let listing = state
        .browser
        .tree(query.path.as_deref(), query.depth)
        .await?;

    Ok(Json(GatewayResponse::ok(
        format!("File tree for {}", listing.path),
        json!(listing),
    )))
}

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|r| GatewayError::validation(r.body_text()))?;
    let safe_path = validate_path(&query.path, &state.config.allowed_root)?;
    let data = state.fetcher.fetch(&safe_path).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        file_name(&safe_path).replace('"', "")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}
