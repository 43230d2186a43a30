use crate::error::GatewayResult;
use async_trait::async_trait;

pub mod docker;
pub mod local;

pub use docker::DockerRuntime;
pub use local::LocalRuntime;

/// Raw result of one exec call, streams kept apart.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    /// `None` when the engine could not report an exit status
    pub exit_code: Option<i64>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// The container engine surface the gateway relies on.
///
/// Implementations report a missing container as
/// [`GatewayError::ContainerNotFound`](crate::error::GatewayError) and a missing
/// archive path as `NotFound`; everything else is `Transport`.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn exec(&self, container: &str, argv: &[String], workdir: &str)
        -> GatewayResult<ExecOutput>;

    /// Tar stream of `path`, fully buffered.
    async fn get_archive(&self, container: &str, path: &str) -> GatewayResult<Vec<u8>>;

    /// Unpack `archive` into `dir` inside the container.
    async fn put_archive(&self, container: &str, dir: &str, archive: Vec<u8>)
        -> GatewayResult<()>;

    async fn logs(&self, container: &str, tail_lines: usize) -> GatewayResult<Vec<u8>>;

    /// Engine-reported state such as `running` or `exited`.
    async fn status(&self, container: &str) -> GatewayResult<String>;
}
