use crate::config::GatewayConfig;
use crate::env::EnvStore;
use crate::error::GatewayError;
use crate::files::{FileBrowser, FileFetcher};
use crate::logs::{LogReader, DEFAULT_LOG_LINES};
use crate::runtime::ContainerRuntime;
use crate::sandbox::{CodeExecutor, CommandExecutor};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod env;
pub mod files;
pub mod response;

pub use response::{ApiError, GatewayResponse};

pub const SERVICE_NAME: &str = "LLM Sandbox Gateway";

pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub env: EnvStore,
    pub commands: CommandExecutor,
    pub code: CodeExecutor,
    pub browser: FileBrowser,
    pub fetcher: FileFetcher,
    pub logs: LogReader,
    started: Instant,
}

impl AppState {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: GatewayConfig) -> Self {
        let config = Arc::new(config);
        let commands = CommandExecutor::new(runtime.clone(), config.clone());

        Self {
            env: EnvStore::new(config.env_file.clone()),
            code: CodeExecutor::new(runtime.clone(), config.clone()),
            browser: FileBrowser::new(commands.clone(), config.clone()),
            fetcher: FileFetcher::new(runtime.clone(), config.clone()),
            logs: LogReader::new(runtime.clone(), config.clone()),
            commands,
            runtime,
            config,
            started: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/run-command", post(run_command))
        .route("/run-python", post(run_python))
        .route("/terminal-logs", post(terminal_logs))
        .route("/env", get(env::list_env).put(env::set_env))
        .route("/env/bulk", post(env::bulk_set_env))
        .route("/env/:variable_name", delete(env::delete_env))
        .route("/files/tree", get(files::file_tree))
        .route("/files/download", get(files::download_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = router(state.clone());

    info!(
        "{} listening on {} (container '{}')",
        SERVICE_NAME, addr, state.config.container
    );

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn service_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started.elapsed().as_secs(),
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = match state.runtime.status(&state.config.container).await {
        Ok(status) => status,
        Err(GatewayError::ContainerNotFound { .. }) => "not found".to_string(),
        Err(e) => {
            warn!("Health check could not reach the engine: {}", e);
            "error".to_string()
        }
    };

    Json(json!({
        "gateway": "ok",
        "sandbox_container": status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RunCommandRequest {
    pub command: String,
    pub workdir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunPythonRequest {
    pub code: String,
    pub workdir: Option<String>,
}

async fn run_command(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunCommandRequest>, JsonRejection>,
) -> Json<GatewayResponse> {
    let result = match payload {
        Ok(Json(req)) => state.commands.run(&req.command, req.workdir.as_deref()).await,
        Err(rejection) => Err(GatewayError::validation(rejection.body_text())),
    };

    Json(match result {
        Ok(result) => GatewayResponse::from_execution(result),
        Err(e) => {
            warn!("Command execution failed: {}", e);
            GatewayResponse::execution_failure("Failed to execute command", &e)
        }
    })
}

async fn run_python(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunPythonRequest>, JsonRejection>,
) -> Json<GatewayResponse> {
    let result = match payload {
        Ok(Json(req)) => state.code.run(&req.code, req.workdir.as_deref()).await,
        Err(rejection) => Err(GatewayError::validation(rejection.body_text())),
    };

    Json(match result {
        Ok(result) => GatewayResponse::from_execution(result),
        Err(e) => {
            warn!("Code execution failed: {}", e);
            GatewayResponse::execution_failure("Failed to execute Python code", &e)
        }
    })
}

fn default_log_container() -> String {
    crate::config::DEFAULT_CONTAINER.to_string()
}

fn default_log_lines() -> usize {
    DEFAULT_LOG_LINES
}

#[derive(Debug, Deserialize)]
pub struct ContainerLogsRequest {
    #[serde(default = "default_log_container")]
    pub container_name: String,
    #[serde(default = "default_log_lines")]
    pub num_lines: usize,
}

async fn terminal_logs(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContainerLogsRequest>, JsonRejection>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| GatewayError::validation(r.body_text()))?;

    match state.logs.tail(&req.container_name, req.num_lines).await {
        Ok(logs) => {
            let message = if logs.pruned {
                "Logs retrieved (pruned)"
            } else {
                "Logs retrieved"
            };
            Ok(Json(GatewayResponse::ok(message, json!(logs))))
        }
        Err(e @ GatewayError::Validation { .. }) => Err(e.into()),
        Err(GatewayError::ContainerNotFound { container }) => Ok(Json(GatewayResponse::failure(
            format!("Container '{}' not found", container),
        ))),
        Err(e) => Ok(Json(GatewayResponse::failure(format!(
            "Failed to retrieve container logs: {}",
            e
        )))),
    }
}
