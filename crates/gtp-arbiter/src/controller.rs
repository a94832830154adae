//! Match controller - the turn-alternation state machine.
//!
//! Drives one or two peers through a two-player alternating game:
//!
//! 1. `AwaitFirstMove`: ask peer 0 to generate the first move.
//! 2. `Alternating`: the active peer applies the opponent's last move, then
//!    generates its own; two consecutive passes end the game.
//! 3. `Scoring`: board display (diagnostic) and final score query.
//! 4. `Terminated`: all peers are closed exactly once, on every exit path.
//!
//! The loop is strictly sequential: one outstanding request at a time, and
//! the controller blocks until that peer's complete framed response arrives
//! or the peer disconnects. There is deliberately no read deadline; a future
//! version can add one at the `exchange` boundary without changing the
//! framing contract.

use crate::channel::Response;
use crate::peer::{Peer, PeerRole};
use crate::protocol::{self, Color};

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("communication lost with {role}")]
    CommunicationLost { role: PeerRole },
}

/// Result of a completed match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Final score text as reported by the engine, e.g. `W+2.5`.
    pub score: String,
    /// Full alternating iterations completed after the first move.
    pub turns: u32,
}

/// Mutable match state, updated once per completed exchange.
#[derive(Debug, Default)]
struct MatchState {
    mover: usize,
    last_vertex: Option<String>,
    consecutive_passes: u8,
    turn: u32,
}

impl MatchState {
    /// Record a generated vertex: a pass increments the consecutive-pass
    /// counter, anything else resets it to zero.
    fn record(&mut self, vertex: String) {
        if protocol::is_pass(&vertex) {
            self.consecutive_passes += 1;
        } else {
            self.consecutive_passes = 0;
        }
        self.last_vertex = Some(vertex);
    }

    fn both_passed(&self) -> bool {
        self.consecutive_passes >= 2
    }
}

/// Drives a match over one or two peers until double-pass or failure.
///
/// With two peers, peer 0 plays black and peer 1 white. With a single peer
/// the same engine is asked to generate for both colors alternately; it
/// tracks its own moves, so no apply exchanges are issued.
pub struct MatchController {
    peers: Vec<Peer>,
    state: MatchState,
}

impl MatchController {
    pub fn new(peers: Vec<Peer>) -> Self {
        debug_assert!(matches!(peers.len(), 1 | 2));
        Self {
            peers,
            state: MatchState::default(),
        }
    }

    /// Run the match to completion.
    ///
    /// All peers are closed before this returns, whichever path reached
    /// `Terminated`; on orderly completion the termination command is sent
    /// first, best-effort.
    pub async fn run(mut self) -> Result<MatchOutcome, MatchError> {
        let result = self.drive().await;
        self.shutdown(result.is_ok()).await;
        result
    }

    async fn drive(&mut self) -> Result<MatchOutcome, MatchError> {
        // AwaitFirstMove: peer 0 opens as black.
        let vertex = self.generate(0, Color::Black).await?;
        self.state.record(vertex);
        self.state.mover = 1;

        // Alternating.
        while !self.state.both_passed() {
            let mover = self.state.mover;
            let own = color_of(mover);

            // An engine records its own generated moves on its board; only a
            // second engine needs the opponent's last move applied before it
            // can generate.
            if self.peers.len() > 1 {
                let last = self
                    .state
                    .last_vertex
                    .clone()
                    .unwrap_or_else(|| protocol::PASS.to_string());
                self.apply(mover, own.opponent(), &last).await?;
            }

            let vertex = self.generate(mover, own).await?;

            tracing::info!(turn = self.state.turn, mover = %role_of(&self.peers, mover), %vertex, "Move recorded");
            self.state.record(vertex);
            self.state.mover = 1 - mover;
            self.state.turn += 1;
        }

        // Scoring.
        let scorer = self.state.mover;
        match self.exchange(scorer, protocol::showboard()).await {
            Ok(board) => tracing::info!(board = %board.raw(), "Final position"),
            Err(e) => tracing::warn!(error = %e, "Board display unavailable"),
        }

        let reply = self.exchange(scorer, protocol::final_score()).await?;
        let score = self.require_payload(scorer, &reply)?.to_string();
        tracing::info!(%score, turns = self.state.turn, "Match scored");

        Ok(MatchOutcome {
            score,
            turns: self.state.turn,
        })
    }

    /// Ask the active peer to play the opponent's last move.
    async fn apply(&mut self, idx: usize, color: Color, vertex: &str) -> Result<(), MatchError> {
        let reply = self.exchange(idx, &protocol::play(color, vertex)).await?;
        if reply.is_empty() {
            return Err(self.lost(idx));
        }
        Ok(())
    }

    /// Ask a peer to generate a move for `color`, returning the trimmed vertex.
    async fn generate(&mut self, idx: usize, color: Color) -> Result<String, MatchError> {
        let reply = self.exchange(idx, &protocol::genmove(color)).await?;
        let vertex = self.require_payload(idx, &reply)?;
        Ok(vertex.to_string())
    }

    async fn exchange(&mut self, idx: usize, command: &str) -> Result<Response, MatchError> {
        let peer = self.active_peer(idx);
        tracing::debug!(role = %peer.role(), %command, "Sending command");
        match peer.send(command).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                tracing::error!(error = %e, "Exchange failed");
                Err(MatchError::CommunicationLost { role: e.role() })
            }
        }
    }

    /// Empty or all-wrapper replies mean the peer is gone, not a real answer.
    fn require_payload<'r>(&self, idx: usize, reply: &'r Response) -> Result<&'r str, MatchError> {
        let payload = protocol::trim_reply(reply.raw());
        if payload.is_empty() {
            return Err(self.lost(idx));
        }
        Ok(payload)
    }

    fn lost(&self, idx: usize) -> MatchError {
        MatchError::CommunicationLost {
            role: role_of(&self.peers, idx),
        }
    }

    fn active_peer(&mut self, idx: usize) -> &mut Peer {
        let n = self.peers.len();
        &mut self.peers[idx % n]
    }

    async fn shutdown(&mut self, orderly: bool) {
        for peer in &mut self.peers {
            if orderly && peer.is_open() {
                let _ = peer.send(protocol::quit()).await;
            }
            peer.close();
        }
    }
}

fn color_of(mover: usize) -> Color {
    if mover == 0 { Color::Black } else { Color::White }
}

fn role_of(peers: &[Peer], idx: usize) -> PeerRole {
    peers[idx % peers.len()].role()
}
