//! Single-peer interactive session.
//!
//! Forwards commands from a `CommandSource` to one peer and prints each
//! framed reply, until the source runs dry or the peer closes (a `quit`
//! closes it immediately, without waiting for a reply).

use tokio::io::AsyncWriteExt;

use crate::command::CommandSource;
use crate::peer::{Peer, PeerError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Peer(#[from] PeerError),
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Drive the session to completion. The peer is closed on every exit path.
pub async fn run_session(
    mut peer: Peer,
    source: &mut dyn CommandSource,
) -> Result<(), SessionError> {
    let result = drive(&mut peer, source).await;
    peer.close();
    result
}

async fn drive(peer: &mut Peer, source: &mut dyn CommandSource) -> Result<(), SessionError> {
    let mut stdout = tokio::io::stdout();

    while let Some(command) = source.next_command().await? {
        if command.trim().is_empty() {
            continue;
        }

        let response = peer.send(&command).await?;
        if !response.is_empty() {
            stdout.write_all(response.raw().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        if !peer.is_open() {
            tracing::info!(role = %peer.role(), "Session ended by termination command");
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::FramedChannel;
    use crate::command::ScriptSource;
    use crate::peer::PeerRole;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, split};

    fn echo_peer() -> Peer {
        let (near, far) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            let (r, mut w) = split(far);
            let mut lines = BufReader::new(r).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line == "quit" {
                    break;
                }
                w.write_all(format!("= {line}\n\n").as_bytes()).await.unwrap();
            }
        });
        let (r, w) = split(near);
        Peer::new(PeerRole::Server, "echo", FramedChannel::new(r, w))
    }

    #[tokio::test]
    async fn scripted_session_runs_to_quit() {
        let mut source = ScriptSource::new(["boardsize 9", "", "quit", "never sent"]);
        run_session(echo_peer(), &mut source).await.unwrap();
        // "never sent" is unreachable: quit closed the peer first.
        assert_eq!(source.next_command().await.unwrap().as_deref(), Some("never sent"));
    }

    #[tokio::test]
    async fn session_ends_when_source_runs_dry() {
        let mut source = ScriptSource::new(["known_command play"]);
        run_session(echo_peer(), &mut source).await.unwrap();
    }

    #[tokio::test]
    async fn disconnect_surfaces_peer_identity() {
        let (near, far) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let (r, _w) = split(far);
            let mut lines = BufReader::new(r).lines();
            let _ = lines.next_line().await;
            // Drop without replying.
        });
        let (r, w) = split(near);
        let peer = Peer::new(PeerRole::Server, "flaky", FramedChannel::new(r, w));

        let mut source = ScriptSource::new(["genmove b"]);
        let err = run_session(peer, &mut source).await.unwrap_err();
        assert!(matches!(err, SessionError::Peer(_)));
        assert!(err.to_string().contains("server"));
    }
}
