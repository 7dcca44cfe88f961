//! HTTP server binary for the avatar response pipeline.

use academy::config::AcademyConfig;
use academy::pipeline::ResponseAssembler;
use academy::server::ChatServer;
use academy::{academy_dirs, logging};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Academy avatar response server.
#[derive(Parser)]
#[command(name = "academy-server", version, about)]
struct Cli {
    /// Path to TOML configuration file (defaults to the user config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the config file.
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(AcademyConfig::default_config_path);
    let mut config = if path.is_file() {
        AcademyConfig::from_file(&path)?
    } else {
        AcademyConfig::default()
    };
    config.apply_env_overrides()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _log_guard = logging::init(&config.logging)?;
    info!(config = %path.display(), provider = ?config.llm.provider, "starting academy server");

    let scratch = academy_dirs::scratch_dir();
    let assembler = Arc::new(ResponseAssembler::from_config(&config, scratch)?);
    let server = ChatServer::start(&config.server, assembler).await?;
    println!("Academy server v{} on {}", env!("CARGO_PKG_VERSION"), server.base_url());

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("received Ctrl+C, shutting down...");
        }
        result = server.wait() => result?,
    }
    Ok(())
}
