use super::{ContainerRuntime, ExecOutput};
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Runs everything on the host, treating the host filesystem as the
/// container's. Meant for development without a Docker engine and for tests.
#[derive(Debug, Clone, Default)]
pub struct LocalRuntime;

impl LocalRuntime {
    pub fn new() -> Self {
        Self
    }
}

fn pack_path(path: &Path) -> GatewayResult<Vec<u8>> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(GatewayError::not_found(format!(
                "File not found: {}",
                path.display()
            )))
        }
        Err(e) => return Err(GatewayError::transport("stat path", e)),
    };

    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut builder = tar::Builder::new(Vec::new());
    builder.follow_symlinks(false);

    let appended = if meta.is_dir() {
        builder.append_dir_all(&name, path)
    } else {
        builder.append_path_with_name(path, &name)
    };
    appended.map_err(|e| GatewayError::transport("build archive", e))?;

    builder
        .into_inner()
        .map_err(|e| GatewayError::transport("build archive", e))
}

#[async_trait]
impl ContainerRuntime for LocalRuntime {
    async fn exec(
        &self,
        _container: &str,
        argv: &[String],
        workdir: &str,
    ) -> GatewayResult<ExecOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| GatewayError::validation("empty argv"))?;

        debug!("Local exec in {}: {:?}", workdir, argv);

        let output = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .output()
            .await
            .map_err(|e| GatewayError::transport("spawn process", e))?;

        Ok(ExecOutput {
            exit_code: output.status.code().map(i64::from),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn get_archive(&self, _container: &str, path: &str) -> GatewayResult<Vec<u8>> {
        let path = PathBuf::from(path);
        tokio::task::spawn_blocking(move || pack_path(&path))
            .await
            .map_err(|e| GatewayError::transport("build archive", e))?
    }

    async fn put_archive(
        &self,
        _container: &str,
        dir: &str,
        archive: Vec<u8>,
    ) -> GatewayResult<()> {
        let dir = PathBuf::from(dir);
        tokio::task::spawn_blocking(move || {
            tar::Archive::new(Cursor::new(archive))
                .unpack(&dir)
                .map_err(|e| GatewayError::transport("unpack archive", e))
        })
        .await
        .map_err(|e| GatewayError::transport("unpack archive", e))?
    }

    async fn logs(&self, _container: &str, _tail_lines: usize) -> GatewayResult<Vec<u8>> {
        // Host processes have no container log stream
        Ok(Vec::new())
    }

    async fn status(&self, _container: &str) -> GatewayResult<String> {
        Ok("running".to_string())
    }
}
