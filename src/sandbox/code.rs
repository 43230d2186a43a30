use super::{shell, ExecutionResult};
use crate::archive;
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::runtime::ContainerRuntime;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

pub const SCRIPT_PREFIX: &str = "_llm_run_";
pub const SCRIPT_EXTENSION: &str = ".py";

/// `_llm_run_<12 hex>.py`
pub fn script_name() -> String {
    let mut suffix = [0u8; 6];
    rand::thread_rng().fill(&mut suffix);
    format!("{}{}{}", SCRIPT_PREFIX, hex::encode(suffix), SCRIPT_EXTENSION)
}

/// Runs source code by uploading it as a throwaway script, so the payload
/// never passes through shell quoting.
#[derive(Clone)]
pub struct CodeExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    config: Arc<GatewayConfig>,
}

impl CodeExecutor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: Arc<GatewayConfig>) -> Self {
        Self { runtime, config }
    }

    pub async fn run(&self, code: &str, workdir: Option<&str>) -> GatewayResult<ExecutionResult> {
        let workdir = self.config.resolve_workdir(workdir);
        let name = script_name();
        let script_path = shell::join_posix(&self.config.scratch_dir, &name);

        let tar = archive::single_file_archive(&name, code.as_bytes())?;
        self.runtime
            .put_archive(&self.config.container, &self.config.scratch_dir, tar)
            .await?;

        // The script removes itself inside the same shell
        let composite = shell::script_line(
            &self.config.sandbox_env_file,
            workdir,
            &self.config.interpreter,
            &script_path,
        );

        info!(
            "Executing script {} in sandbox ({}): {} chars",
            name,
            workdir,
            code.len()
        );
        let output = self
            .runtime
            .exec(&self.config.container, &shell::sh_argv(composite), workdir)
            .await?;

        Ok(ExecutionResult::from_output(output, self.config.max_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_script_name_shape() {
        let name = script_name();
        assert!(name.starts_with(SCRIPT_PREFIX));
        assert!(name.ends_with(SCRIPT_EXTENSION));
        let suffix = &name[SCRIPT_PREFIX.len()..name.len() - SCRIPT_EXTENSION.len()];
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_script_names_are_distinct() {
        let names: HashSet<String> = (0..1_000).map(|_| script_name()).collect();
        assert_eq!(names.len(), 1_000);
    }
}
