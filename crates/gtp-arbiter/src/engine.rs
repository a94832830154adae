//! Engine process spawning.
//!
//! External collaborator boundary: start an engine with validated, structured
//! parameters and hand back a child handle. Arguments are always passed as an
//! argv vector, never interpolated into a shell string.

use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::channel::FramedChannel;
use crate::peer::{Peer, PeerRole};

/// Typed launch parameters for one engine process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub host: String,
    /// When set, the engine listens for a GTP connection on `host:port`
    /// and stdio is unused; when unset, the engine speaks GTP on its
    /// stdin/stdout pipe pair.
    pub port: Option<u16>,
    pub board_size: Option<u32>,
}

impl EngineConfig {
    pub fn pipe() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            board_size: None,
        }
    }

    pub fn listen(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
            board_size: None,
        }
    }

    pub fn with_board_size(mut self, size: Option<u32>) -> Self {
        self.board_size = size;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to spawn engine process: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine {0} not captured")]
    Stdio(&'static str),
}

/// Extension point for different engine launch strategies.
pub trait EngineSpawner: Send + Sync {
    fn spawn(&self, config: &EngineConfig) -> Result<Child, SpawnError>;
}

/// Default spawner for GNU Go in GTP mode.
pub struct GnugoSpawner;

fn gnugo_args(config: &EngineConfig) -> Vec<String> {
    let mut args = vec!["--mode".to_string(), "gtp".to_string()];
    if let Some(size) = config.board_size {
        args.push("--boardsize".to_string());
        args.push(size.to_string());
    }
    if let Some(port) = config.port {
        args.push("--gtp-listen".to_string());
        args.push(format!("{}:{}", config.host, port));
    }
    args
}

impl EngineSpawner for GnugoSpawner {
    fn spawn(&self, config: &EngineConfig) -> Result<Child, SpawnError> {
        let args = gnugo_args(config);
        tracing::info!(?args, "Spawning engine process");

        let mut cmd = Command::new("gnugo");
        cmd.args(&args).stderr(Stdio::inherit()).kill_on_drop(true);

        if config.port.is_some() {
            cmd.stdin(Stdio::null()).stdout(Stdio::null());
        } else {
            cmd.stdin(Stdio::piped()).stdout(Stdio::piped());
        }

        let child = cmd.spawn()?;
        Ok(child)
    }
}

/// Wrap a pipe-mode child's stdio pair as a peer.
pub fn pipe_peer(child: &mut Child, role: PeerRole) -> Result<Peer, SpawnError> {
    let stdin = child.stdin.take().ok_or(SpawnError::Stdio("stdin"))?;
    let stdout = child.stdout.take().ok_or(SpawnError::Stdio("stdout"))?;
    Ok(Peer::new(role, "pipe", FramedChannel::new(stdout, stdin)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_config_builds_structured_args() {
        let config = EngineConfig::listen("127.0.0.1", 20231).with_board_size(Some(9));
        assert_eq!(
            gnugo_args(&config),
            vec![
                "--mode",
                "gtp",
                "--boardsize",
                "9",
                "--gtp-listen",
                "127.0.0.1:20231"
            ]
        );
    }

    #[test]
    fn pipe_config_omits_listen_args() {
        let config = EngineConfig::pipe();
        assert_eq!(gnugo_args(&config), vec!["--mode", "gtp"]);
    }
}
