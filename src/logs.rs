use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::runtime::ContainerRuntime;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub const MAX_LOG_CHARS: usize = 5_000;
pub const DEFAULT_LOG_LINES: usize = 50;
pub const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalLogs {
    pub logs: String,
    pub pruned: bool,
    pub character_count: usize,
}

/// Keep the last `max_chars` characters of `logs`.
pub fn prune_logs(logs: String, max_chars: usize) -> TerminalLogs {
    let total = logs.chars().count();
    let (logs, pruned) = if total > max_chars {
        let skip = logs
            .char_indices()
            .nth(total - max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        (logs[skip..].to_string(), true)
    } else {
        (logs, false)
    };

    TerminalLogs {
        character_count: logs.chars().count(),
        logs,
        pruned,
    }
}

#[derive(Clone)]
pub struct LogReader {
    runtime: Arc<dyn ContainerRuntime>,
    config: Arc<GatewayConfig>,
}

impl LogReader {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: Arc<GatewayConfig>) -> Self {
        Self { runtime, config }
    }

    /// Tail of the sandbox container's log stream. Only the configured
    /// container may be named.
    pub async fn tail(&self, container: &str, num_lines: usize) -> GatewayResult<TerminalLogs> {
        if container != self.config.container {
            return Err(GatewayError::validation(format!(
                "Unknown container '{}': only '{}' is managed",
                container, self.config.container
            )));
        }
        if !(1..=MAX_LOG_LINES).contains(&num_lines) {
            return Err(GatewayError::validation(format!(
                "num_lines must be between 1 and {}",
                MAX_LOG_LINES
            )));
        }

        info!("Reading last {} log lines of {}", num_lines, container);
        let raw = self.runtime.logs(container, num_lines).await?;
        Ok(prune_logs(
            String::from_utf8_lossy(&raw).into_owned(),
            MAX_LOG_CHARS,
        ))
    }
}
