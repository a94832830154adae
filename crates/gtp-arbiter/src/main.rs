//! gtp-arbiter binary: interactive GTP sessions and engine-vs-engine matches.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gtp_arbiter::command::StdinSource;
use gtp_arbiter::controller::MatchController;
use gtp_arbiter::engine::{self, EngineConfig, EngineSpawner, GnugoSpawner};
use gtp_arbiter::peer::PeerRole;
use gtp_arbiter::session::run_session;
use gtp_arbiter::transport::{self, Listener};

const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "gtp-arbiter")]
#[command(about = "A wrapper and match arbiter for Go Text Protocol engines")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Interactive session: spawn an engine, connect, forward stdin commands
    Session {
        /// Connect host
        #[arg(short = 'a', long, default_value = "127.0.0.1")]
        host: String,
        /// Connect port
        #[arg(short, long, value_parser = port_in_range, value_name = "1..65535")]
        port: u16,
        /// Board size passed through to the engine
        #[arg(long)]
        boardsize: Option<u32>,
        /// Connect to an already-running engine instead of spawning one
        #[arg(long)]
        no_spawn: bool,
    },
    /// Two spawned engines play each other over pipes
    Run {
        /// Board size passed through to both engines
        #[arg(long)]
        boardsize: Option<u32>,
    },
    /// Accept inbound engine connections, then run the match
    Listen {
        /// Bind host
        #[arg(short = 'a', long, default_value = "127.0.0.1")]
        host: String,
        /// Bind port
        #[arg(short, long, value_parser = port_in_range, value_name = "1..65535")]
        port: u16,
        /// Number of engines to accept before the match starts
        #[arg(long, default_value_t = 2)]
        engines: usize,
    },
}

fn port_in_range(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(0) | Err(_) => Err("port number must be between 1 and 65535".to_string()),
        Ok(port) => Ok(port),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Mode::Session {
            host,
            port,
            boardsize,
            no_spawn,
        } => session(host, port, boardsize, no_spawn).await,
        Mode::Run { boardsize } => run_match(boardsize).await,
        Mode::Listen {
            host,
            port,
            engines,
        } => listen_match(host, port, engines).await,
    }
}

async fn session(
    host: String,
    port: u16,
    boardsize: Option<u32>,
    no_spawn: bool,
) -> anyhow::Result<()> {
    let _child = if no_spawn {
        None
    } else {
        let config = EngineConfig::listen(host.clone(), port).with_board_size(boardsize);
        Some(
            GnugoSpawner
                .spawn(&config)
                .context("failed to start engine")?,
        )
    };

    let peer = transport::connect_with_retry(
        &host,
        port,
        PeerRole::Server,
        CONNECT_ATTEMPTS,
        CONNECT_RETRY_DELAY,
    )
    .await
    .with_context(|| format!("engine at {host}:{port} never accepted"))?;

    let mut source = StdinSource::new();
    run_session(peer, &mut source).await?;
    Ok(())
}

async fn run_match(boardsize: Option<u32>) -> anyhow::Result<()> {
    let config = EngineConfig::pipe().with_board_size(boardsize);
    let mut peers = Vec::with_capacity(2);
    let mut children = Vec::with_capacity(2);

    for i in 0..2 {
        let mut child = GnugoSpawner
            .spawn(&config)
            .with_context(|| format!("failed to start engine-{}", i + 1))?;
        peers.push(engine::pipe_peer(&mut child, PeerRole::Engine(i))?);
        children.push(child);
    }

    let outcome = MatchController::new(peers).run().await?;
    println!("{}", outcome.score);

    for mut child in children {
        let _ = child.wait().await;
    }
    Ok(())
}

async fn listen_match(host: String, port: u16, engines: usize) -> anyhow::Result<()> {
    anyhow::ensure!(
        matches!(engines, 1 | 2),
        "a match takes one or two engines, got {engines}"
    );

    let listener = Listener::bind(&host, port).await?;
    tracing::info!(addr = %listener.local_addr()?, engines, "Waiting for engines");

    let peers = listener.accept_peers(engines).await?;
    let outcome = MatchController::new(peers).run().await?;
    println!("{}", outcome.score);
    Ok(())
}
