use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_CONTAINER: &str = "sandbox";
pub const DEFAULT_WORKDIR: &str = "/workspace";
pub const DEFAULT_ENV_FILE: &str = "/sandbox-env/.env";
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Maximum characters kept per captured stream
pub const MAX_OUTPUT_LENGTH: usize = 10_000;

/// Settings shared by every gateway component.
///
/// The env file is addressed twice: `env_file` is where the gateway writes it,
/// `sandbox_env_file` is where the same volume is mounted inside the container.
#[derive(Debug, Clone, Args)]
pub struct GatewayConfig {
    /// Name of the sandbox container
    #[arg(long, env = "SANDBOX_CONTAINER", default_value = DEFAULT_CONTAINER)]
    pub container: String,

    /// Default working directory for commands
    #[arg(long, env = "SANDBOX_WORKDIR", default_value = DEFAULT_WORKDIR)]
    pub workdir: String,

    /// Env file path as seen by the gateway
    #[arg(long, env = "SANDBOX_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Env file path as seen inside the container
    #[arg(long, env = "SANDBOX_ENV_FILE_IN_CONTAINER", default_value = DEFAULT_ENV_FILE)]
    pub sandbox_env_file: String,

    /// Root directory for file browsing and downloads
    #[arg(long, env = "SANDBOX_ALLOWED_ROOT", default_value = DEFAULT_WORKDIR)]
    pub allowed_root: String,

    /// Directory receiving uploaded scripts
    #[arg(long, env = "SANDBOX_SCRATCH_DIR", default_value = DEFAULT_SCRATCH_DIR)]
    pub scratch_dir: String,

    /// Interpreter used for code execution
    #[arg(long, env = "SANDBOX_INTERPRETER", default_value = DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// Per-stream output limit in characters
    #[arg(long, env = "SANDBOX_MAX_OUTPUT", default_value_t = MAX_OUTPUT_LENGTH)]
    pub max_output: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            workdir: DEFAULT_WORKDIR.to_string(),
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
            sandbox_env_file: DEFAULT_ENV_FILE.to_string(),
            allowed_root: DEFAULT_WORKDIR.to_string(),
            scratch_dir: DEFAULT_SCRATCH_DIR.to_string(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            max_output: MAX_OUTPUT_LENGTH,
        }
    }
}

impl GatewayConfig {
    /// Config where both sides of the env volume are the same local path.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.sandbox_env_file = path.to_string_lossy().into_owned();
        self.env_file = path;
        self
    }

    pub fn resolve_workdir<'a>(&'a self, workdir: Option<&'a str>) -> &'a str {
        match workdir {
            Some(dir) if !dir.trim().is_empty() => dir,
            _ => &self.workdir,
        }
    }
}
