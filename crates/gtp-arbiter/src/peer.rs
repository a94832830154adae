//! A named, addressable match participant.
//!
//! Pairs a framed channel with an identity so failures can be attributed to
//! the offending peer, and tracks liveness so the endpoint is released
//! exactly once.

use crate::channel::{ChannelError, FramedChannel, Response};

/// Identity tag carried in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    /// Engine by mover index; displayed one-based (`engine-1`, `engine-2`).
    Engine(usize),
    /// Remote end we connected out to.
    Server,
    /// Remote end that connected in to us.
    Client,
}

impl std::fmt::Display for PeerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerRole::Engine(i) => write!(f, "engine-{}", i + 1),
            PeerRole::Server => f.write_str("server"),
            PeerRole::Client => f.write_str("client"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Open,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("peer {role} ({addr}) unavailable: {source}")]
    Unavailable {
        role: PeerRole,
        addr: String,
        #[source]
        source: ChannelError,
    },
}

impl PeerError {
    pub fn role(&self) -> PeerRole {
        match self {
            PeerError::Unavailable { role, .. } => *role,
        }
    }
}

/// One participant process/connection for the lifetime of a match.
pub struct Peer {
    role: PeerRole,
    addr: String,
    channel: Option<FramedChannel>,
    state: Liveness,
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("role", &self.role)
            .field("addr", &self.addr)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Peer {
    pub fn new(role: PeerRole, addr: impl Into<String>, channel: FramedChannel) -> Self {
        Self {
            role,
            addr: addr.into(),
            channel: Some(channel),
            state: Liveness::Open,
        }
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_open(&self) -> bool {
        self.state == Liveness::Open
    }

    /// Send one command and wait for its framed reply.
    ///
    /// Any channel failure transitions the peer to Closed and is reported
    /// with this peer's identity attached. `quit` succeeds with an empty
    /// reply and likewise closes the peer.
    pub async fn send(&mut self, command: &str) -> Result<Response, PeerError> {
        let channel = match self.channel.as_mut() {
            Some(channel) if self.state == Liveness::Open => channel,
            _ => {
                return Err(PeerError::Unavailable {
                    role: self.role,
                    addr: self.addr.clone(),
                    source: ChannelError::Closed,
                });
            }
        };

        match channel.send(command).await {
            Ok(resp) => {
                if !channel.is_open() {
                    self.close();
                }
                Ok(resp)
            }
            Err(source) => {
                tracing::warn!(role = %self.role, addr = %self.addr, error = %source, "Peer exchange failed");
                self.close();
                Err(PeerError::Unavailable {
                    role: self.role,
                    addr: self.addr.clone(),
                    source,
                })
            }
        }
    }

    /// Release the endpoint. Idempotent; the underlying streams are dropped
    /// on the first call only.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            tracing::debug!(role = %self.role, addr = %self.addr, "Closing peer");
            drop(channel);
        }
        self.state = Liveness::Closed;
    }
}
