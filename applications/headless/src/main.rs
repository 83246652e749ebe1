//! Castline headless player

use anyhow::Context;
use castline_headless::{
    commands::{self, Command, HELP},
    config::HeadlessConfig,
    engine::SimulatedEngine,
    navigator::SequentialNavigator,
};
use castline_playback::{
    EngineEvent, EpisodeMetadata, EpisodeRef, IntentPolicy, Orchestrator, PlaybackEvent,
};
use castline_server_client::{CastlineServerClient, ServerConfig};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "castline-headless")]
#[command(about = "Play Castline episodes from the terminal with a simulated engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server base URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    /// Bearer token for the server
    #[arg(long, env = "CASTLINE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Show to open on start
    #[arg(long, requires = "episode")]
    show: Option<String>,

    /// Episode to open on start
    #[arg(long, requires = "show")]
    episode: Option<String>,

    /// Advance to the next episode when one finishes
    #[arg(long)]
    autoplay: bool,

    /// Highest episode number autoplay may reach
    #[arg(long)]
    last_episode: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "castline_headless=info,castline_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = HeadlessConfig::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.url = server;
    }
    if cli.token.is_some() {
        config.server.access_token = cli.token;
    }
    if cli.autoplay {
        config.autoplay.enabled = true;
    }
    if cli.last_episode.is_some() {
        config.autoplay.last_episode = cli.last_episode;
    }
    config.validate()?;

    let server_config = match config.server.access_token.clone() {
        Some(token) => ServerConfig::with_token(config.server.url.clone(), token),
        None => ServerConfig::new(config.server.url.clone()),
    };
    let client =
        Arc::new(CastlineServerClient::new(server_config).context("creating server client")?);
    if let Err(e) = client.test_connection().await {
        tracing::warn!(error = %e, url = %client.url(), "Server check failed, continuing");
    }

    let (engine, engine_events) = SimulatedEngine::spawn(config.engine.clone());
    let orchestrator = Orchestrator::new(client, engine.clone(), config.playback.clone());
    if config.autoplay.enabled {
        let navigator = SequentialNavigator::new(config.autoplay.last_episode);
        orchestrator.set_navigator(Arc::new(navigator));
        tracing::info!(last_episode = ?config.autoplay.last_episode, "Autoplay enabled");
    }

    let pump = tokio::spawn(pump_engine_events(orchestrator.clone(), engine_events));
    let logger = tokio::spawn(log_playback_events(orchestrator.subscribe(), engine.clone()));

    if let (Some(show), Some(episode)) = (cli.show, cli.episode) {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            let metadata = EpisodeMetadata::titled(format!("Episode {}", episode));
            if let Err(e) = orchestrator
                .load_episode(EpisodeRef::new(show, episode), metadata, IntentPolicy::Clear)
                .await
            {
                tracing::error!(error = %e, "Initial load failed");
            }
        });
    }

    println!("{}", HELP);
    run_command_loop(&orchestrator).await?;

    tracing::info!("Shutting down");
    orchestrator.shutdown().await;
    pump.abort();
    // Event stream ends once the orchestrator closes it
    logger.await.ok();

    Ok(())
}

/// Read stdin until `quit`, end of input, or Ctrl-C
async fn run_command_loop(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
        };
        let Some(line) = line else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Quit => return Ok(()),
            Command::Help => println!("{}", HELP),
            Command::Status => {
                let episode = orchestrator.current_episode();
                let state = orchestrator.state();
                println!("{}", commands::status_line(&state, episode.as_ref()));
                if let Some(session) = orchestrator.session() {
                    println!(
                        "session {} synced at {:.1}s",
                        session.session_id,
                        session.last_synced_position.as_secs_f64()
                    );
                }
            }
            other => {
                if let Some(view_command) = other.into_view_command() {
                    // Loads suspend on the network; keep reading so play/pause stay responsive
                    let orchestrator = orchestrator.clone();
                    tokio::spawn(async move {
                        if let Err(e) = orchestrator.dispatch(view_command).await {
                            tracing::warn!(error = %e, "Command failed");
                        }
                    });
                }
            }
        }
    }
}

async fn pump_engine_events(
    orchestrator: Orchestrator,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
) {
    while let Some(event) = events.recv().await {
        orchestrator.handle_engine_event(event).await;
    }
}

async fn log_playback_events(
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
    engine: Arc<SimulatedEngine>,
) {
    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::StateChanged(state) => {
                engine.set_duration(state.duration);
                tracing::debug!(
                    playing = state.is_playing,
                    loading = state.is_loading,
                    paused = state.is_paused,
                    error = state.has_error,
                    progress = state.progress,
                    "State changed"
                );
            }
            PlaybackEvent::EpisodeChanged(episode) => {
                tracing::info!(episode = %episode, "Episode changed");
            }
            PlaybackEvent::EpisodeEnded(episode) => {
                tracing::info!(episode = %episode, "Episode ended, advancing");
            }
            PlaybackEvent::Error { message } => {
                tracing::error!(message = %message, "Playback error");
            }
        }
    }
}
