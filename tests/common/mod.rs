#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sandbox_gateway::config::GatewayConfig;
use sandbox_gateway::error::{GatewayError, GatewayResult};
use sandbox_gateway::runtime::{ContainerRuntime, ExecOutput};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exec { argv: Vec<String>, workdir: String },
    GetArchive { path: String },
    PutArchive { dir: String, archive: Vec<u8> },
    Logs { tail: usize },
}

/// Scripted runtime that records every call it receives.
#[derive(Default)]
pub struct FakeRuntime {
    pub missing_container: bool,
    pub exec_output: ExecOutput,
    pub archive: Option<Vec<u8>>,
    pub logs: Vec<u8>,
    /// Symlinked prefixes as `(link, target)`, applied when paths are resolved
    pub links: Vec<(String, String)>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeRuntime {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn resolve(&self, path: &str) -> String {
        for (link, target) in &self.links {
            if let Some(rest) = path.strip_prefix(link.as_str()) {
                if rest.is_empty() || rest.starts_with('/') {
                    return format!("{}{}", target, rest);
                }
            }
        }
        path.to_string()
    }

    /// Answers `readlink -f -- <path>` invocations, one output line per path.
    fn readlink_output(&self, composite: &str) -> Option<ExecOutput> {
        let mut segments = composite.split("readlink -f -- ").skip(1).peekable();
        segments.peek()?;
        let stdout: String = segments
            .filter_map(|seg| seg.split_whitespace().next())
            .map(|p| format!("{}\n", self.resolve(p.trim_matches('\''))))
            .collect();
        Some(ok_output(&stdout))
    }

    fn check(&self, container: &str) -> GatewayResult<()> {
        if self.missing_container {
            Err(GatewayError::ContainerNotFound {
                container: container.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn exec(
        &self,
        container: &str,
        argv: &[String],
        workdir: &str,
    ) -> GatewayResult<ExecOutput> {
        self.check(container)?;
        self.calls.lock().push(Call::Exec {
            argv: argv.to_vec(),
            workdir: workdir.to_string(),
        });
        let readlink = argv.last().and_then(|c| self.readlink_output(c));
        Ok(readlink.unwrap_or_else(|| self.exec_output.clone()))
    }

    async fn get_archive(&self, container: &str, path: &str) -> GatewayResult<Vec<u8>> {
        self.check(container)?;
        self.calls.lock().push(Call::GetArchive {
            path: path.to_string(),
        });
        self.archive
            .clone()
            .ok_or_else(|| GatewayError::not_found(format!("File not found: {}", path)))
    }

    async fn put_archive(
        &self,
        container: &str,
        dir: &str,
        archive: Vec<u8>,
    ) -> GatewayResult<()> {
        self.check(container)?;
        self.calls.lock().push(Call::PutArchive {
            dir: dir.to_string(),
            archive,
        });
        Ok(())
    }

    async fn logs(&self, container: &str, tail_lines: usize) -> GatewayResult<Vec<u8>> {
        self.check(container)?;
        self.calls.lock().push(Call::Logs { tail: tail_lines });
        Ok(self.logs.clone())
    }

    async fn status(&self, container: &str) -> GatewayResult<String> {
        self.check(container)?;
        Ok("running".to_string())
    }
}

/// Temp dir without a leading dot, so dot-entry filters keep its contents.
pub fn gateway_tempdir() -> tempfile::TempDir {
    tempfile::Builder::new().prefix("gateway-").tempdir().unwrap()
}

/// Config whose workspace, scratch dir and env file all live under `root`.
pub fn local_config(root: &Path) -> GatewayConfig {
    let workspace = root.join("workspace");
    let scratch = root.join("scratch");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::create_dir_all(&scratch).unwrap();

    GatewayConfig {
        workdir: workspace.to_string_lossy().into_owned(),
        allowed_root: workspace.to_string_lossy().into_owned(),
        scratch_dir: scratch.to_string_lossy().into_owned(),
        interpreter: "sh".to_string(),
        ..GatewayConfig::default()
    }
    .with_env_file(root.join("sandbox-env/.env"))
}

pub fn ok_output(stdout: &str) -> ExecOutput {
    ExecOutput {
        exit_code: Some(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}
