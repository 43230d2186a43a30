use super::{ContainerRuntime, ExecOutput};
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use bollard::{
    container::{
        DownloadFromContainerOptions, InspectContainerOptions, LogOutput, LogsOptions,
        UploadToContainerOptions,
    },
    errors::Error as BollardError,
    exec::{CreateExecOptions, StartExecResults},
    Docker,
};
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, error};

/// Container runtime backed by the local Docker engine.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect() -> GatewayResult<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| GatewayError::transport("connect to docker", e))?;
        Ok(Self { docker })
    }
}

fn is_not_found(err: &BollardError) -> bool {
    matches!(
        err,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn map_container_error(container: &str, operation: &str, err: BollardError) -> GatewayError {
    if is_not_found(&err) {
        GatewayError::ContainerNotFound {
            container: container.to_string(),
        }
    } else {
        error!("Docker {} failed for {}: {}", operation, container, err);
        GatewayError::transport(operation, err)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn exec(
        &self,
        container: &str,
        argv: &[String],
        workdir: &str,
    ) -> GatewayResult<ExecOutput> {
        let exec_config = CreateExecOptions {
            cmd: Some(argv.to_vec()),
            working_dir: Some(workdir.to_string()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(container, exec_config)
            .await
            .map_err(|e| map_container_error(container, "create exec", e))?;

        let mut output = ExecOutput::default();

        if let StartExecResults::Attached { output: mut stream, .. } = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| map_container_error(container, "start exec", e))?
        {
            while let Some(msg) = stream.next().await {
                match msg.map_err(|e| GatewayError::transport("read exec output", e))? {
                    LogOutput::StdOut { message } => output.stdout.extend_from_slice(&message),
                    LogOutput::StdErr { message } => output.stderr.extend_from_slice(&message),
                    // Without a tty the engine only multiplexes stdout/stderr
                    LogOutput::Console { message } => output.stdout.extend_from_slice(&message),
                    LogOutput::StdIn { .. } => {}
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| GatewayError::transport("inspect exec", e))?;
        output.exit_code = inspect.exit_code;

        debug!(
            "Exec {} finished with {:?} ({} bytes stdout, {} bytes stderr)",
            exec.id,
            output.exit_code,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(output)
    }

    async fn get_archive(&self, container: &str, path: &str) -> GatewayResult<Vec<u8>> {
        // Distinguish a missing container from a missing path
        self.status(container).await?;

        let options = DownloadFromContainerOptions { path };
        let mut stream = Box::pin(self.docker.download_from_container(container, Some(options)));
        let mut archive = Vec::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => archive.extend_from_slice(&bytes),
                Err(e) if is_not_found(&e) => {
                    return Err(GatewayError::not_found(format!("File not found: {}", path)))
                }
                Err(e) => return Err(GatewayError::transport("download archive", e)),
            }
        }

        Ok(archive)
    }

    async fn put_archive(
        &self,
        container: &str,
        dir: &str,
        archive: Vec<u8>,
    ) -> GatewayResult<()> {
        let options = UploadToContainerOptions {
            path: dir,
            ..Default::default()
        };

        self.docker
            .upload_to_container(container, Some(options), Bytes::from(archive))
            .await
            .map_err(|e| map_container_error(container, "upload archive", e))
    }

    async fn logs(&self, container: &str, tail_lines: usize) -> GatewayResult<Vec<u8>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail_lines.to_string(),
            ..Default::default()
        };

        let mut stream = Box::pin(self.docker.logs(container, Some(options)));
        let mut logs = Vec::new();

        while let Some(msg) = stream.next().await {
            let msg = msg.map_err(|e| map_container_error(container, "read logs", e))?;
            logs.extend_from_slice(&msg.into_bytes());
        }

        Ok(logs)
    }

    async fn status(&self, container: &str) -> GatewayResult<String> {
        let info = self
            .docker
            .inspect_container(container, None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_container_error(container, "inspect container", e))?;

        Ok(info
            .state
            .and_then(|state| state.status)
            .map(|status| status.to_string())
            .unwrap_or_else(|| "unknown".to_string()))
    }
}
