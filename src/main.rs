use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sandbox_gateway::config::GatewayConfig;
use sandbox_gateway::runtime::{ContainerRuntime, DockerRuntime, LocalRuntime};
use sandbox_gateway::sandbox::{CodeExecutor, CommandExecutor, ExecutionResult};
use sandbox_gateway::server::{self, AppState};
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sandbox-gateway", version, about = "Run commands and code inside a sandbox container")]
struct Cli {
    #[command(flatten)]
    config: GatewayConfig,

    /// Container engine backend
    #[arg(long, value_enum, env = "GATEWAY_RUNTIME", default_value_t = RuntimeKind::Docker)]
    runtime: RuntimeKind,

    /// Emit logs as JSON lines
    #[arg(long, env = "GATEWAY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum RuntimeKind {
    Docker,
    /// Host processes, for development without an engine
    Local,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP gateway
    Serve {
        #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0:8001")]
        bind: SocketAddr,
    },
    /// Run one shell command and print the result as JSON
    Run {
        command: String,
        #[arg(long)]
        workdir: Option<String>,
    },
    /// Run a source file (`-` for stdin) and print the result as JSON
    Python {
        file: PathBuf,
        #[arg(long)]
        workdir: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn connect(kind: RuntimeKind) -> Result<Arc<dyn ContainerRuntime>> {
    let runtime: Arc<dyn ContainerRuntime> = match kind {
        RuntimeKind::Docker => {
            Arc::new(DockerRuntime::connect().context("Failed to connect to the Docker engine")?)
        }
        RuntimeKind::Local => Arc::new(LocalRuntime::new()),
    };
    Ok(runtime)
}

fn print_result(result: &ExecutionResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

fn read_source(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("Failed to read code from stdin")?;
        Ok(code)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let runtime = connect(cli.runtime)?;

    match cli.command {
        Command::Serve { bind } => {
            let state = Arc::new(AppState::new(runtime, cli.config));
            server::start_server(bind, state).await?;
        }
        Command::Run { command, workdir } => {
            let executor = CommandExecutor::new(runtime, Arc::new(cli.config));
            let result = executor.run(&command, workdir.as_deref()).await?;
            print_result(&result)?;
        }
        Command::Python { file, workdir } => {
            let code = read_source(&file)?;
            let executor = CodeExecutor::new(runtime, Arc::new(cli.config));
            let result = executor.run(&code, workdir.as_deref()).await?;
            print_result(&result)?;
        }
    }

    Ok(())
}
