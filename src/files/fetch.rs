use super::resolve::resolve_within;
use crate::archive;
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::runtime::ContainerRuntime;
use crate::sandbox::CommandExecutor;
use std::sync::Arc;
use tracing::info;

/// Pulls single files out of the sandbox through the archive primitive.
#[derive(Clone)]
pub struct FileFetcher {
    runtime: Arc<dyn ContainerRuntime>,
    commands: CommandExecutor,
    config: Arc<GatewayConfig>,
}

impl FileFetcher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: Arc<GatewayConfig>) -> Self {
        Self {
            commands: CommandExecutor::new(runtime.clone(), config.clone()),
            runtime,
            config,
        }
    }

    /// Raw bytes of the file at `path`. The path is validated before the
    /// engine is contacted, and again once symlinks are resolved.
    pub async fn fetch(&self, path: &str) -> GatewayResult<Vec<u8>> {
        let real_path = resolve_within(&self.commands, path, &self.config.allowed_root).await?;

        info!("Fetching file from sandbox: {}", real_path);
        let tar = self
            .runtime
            .get_archive(&self.config.container, &real_path)
            .await?;

        archive::extract_first_file(&tar)
    }
}
