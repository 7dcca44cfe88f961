//! Headless chat client: sends messages and plays replies through the
//! playback queue, logging mouth shapes instead of rendering them.

use academy::client::{ChatClient, ChatSession};
use academy::config::AcademyConfig;
use academy::logging;
use academy::playback::{LogSurface, PlaybackScheduler, TimedAudioOutput};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Talk to an Academy tutor from the terminal.
#[derive(Parser)]
#[command(name = "academy-chat", version, about)]
struct Cli {
    /// Server base URL.
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Persona name or slug (e.g. "Logic Leo", "rex").
    #[arg(short, long)]
    persona: Option<String>,

    /// Path to TOML configuration file (playback and logging sections).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// List the server's personas and exit.
    #[arg(long)]
    list_personas: bool,

    /// Messages to send in order. Reads lines from stdin when empty.
    messages: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AcademyConfig::from_file(path)?,
        None => AcademyConfig::default(),
    };
    let _log_guard = logging::init(&config.logging)?;

    let client = ChatClient::new(&cli.url, Duration::from_secs(cli.timeout))?;
    if !client.is_healthy().await {
        warn!(url = %cli.url, "server did not answer the health probe");
    }

    if cli.list_personas {
        for persona in client.personas().await? {
            println!("{:<10} {}", persona.id, persona.name);
        }
        return Ok(());
    }

    let scheduler =
        PlaybackScheduler::spawn(&config.playback, LogSurface::default(), TimedAudioOutput);
    let mut session = ChatSession::new(client, cli.persona);

    if cli.messages.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            send(&mut session, line, &scheduler).await;
        }
    } else {
        for message in &cli.messages {
            send(&mut session, message, &scheduler).await;
        }
    }

    info!(turns = session.history().len(), "waiting for playback to finish");
    scheduler.drain().await?;
    Ok(())
}

async fn send(session: &mut ChatSession, message: &str, scheduler: &PlaybackScheduler) {
    match session.send_and_play(message, scheduler).await {
        Ok(text) => println!("tutor: {text}"),
        Err(e) => eprintln!("error: {e}"),
    }
}
