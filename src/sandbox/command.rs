use super::{shell, ExecutionResult};
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::runtime::ContainerRuntime;
use std::sync::Arc;
use tracing::info;

/// Runs shell commands in the sandbox with the managed env file sourced.
#[derive(Clone)]
pub struct CommandExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    config: Arc<GatewayConfig>,
}

impl CommandExecutor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: Arc<GatewayConfig>) -> Self {
        Self { runtime, config }
    }

    pub async fn run(&self, command: &str, workdir: Option<&str>) -> GatewayResult<ExecutionResult> {
        let workdir = self.config.resolve_workdir(workdir);
        let composite = shell::command_line(&self.config.sandbox_env_file, workdir, command);

        info!("Executing in sandbox ({}): {}", workdir, command);
        let output = self
            .runtime
            .exec(&self.config.container, &shell::sh_argv(composite), workdir)
            .await?;

        Ok(ExecutionResult::from_output(output, self.config.max_output))
    }
}
