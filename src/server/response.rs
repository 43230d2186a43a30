use crate::error::{status_code, GatewayError};
use crate::sandbox::ExecutionResult;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

/// Envelope returned by every JSON endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<Value>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i64>,
}

impl GatewayResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn from_execution(result: ExecutionResult) -> Self {
        Self {
            success: result.success(),
            message: None,
            data: Some(json!({
                "stdout_truncated": result.stdout_truncated,
                "stderr_truncated": result.stderr_truncated,
            })),
            stdout: Some(result.stdout),
            stderr: Some(result.stderr),
            exit_code: result.exit_code,
        }
    }

    /// Executor failures still answer 200, with the error echoed on stderr.
    pub fn execution_failure(context: &str, err: &GatewayError) -> Self {
        Self {
            success: false,
            message: Some(format!("{}: {}", context, err)),
            stderr: Some(err.to_string()),
            ..Default::default()
        }
    }
}

/// A [`GatewayError`] on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0);
        }
        (status, Json(GatewayResponse::failure(self.0.to_string()))).into_response()
    }
}
