//! gtp-arbiter: session driver and match arbiter for Go Text Protocol engines.
//!
//! The core is transport-agnostic: a framed channel over any byte stream
//! (process pipe pair or TCP socket), a peer identity wrapper, and a
//! turn-alternation controller that drives two engines to double-pass and a
//! final score. Engine spawning and interactive input sit at the edges.

pub mod channel;
pub mod codec;
pub mod command;
pub mod controller;
pub mod engine;
pub mod peer;
pub mod protocol;
pub mod session;
pub mod transport;

pub use channel::{ChannelError, FramedChannel, Response};
pub use command::{CommandSource, ScriptSource, StdinSource};
pub use controller::{MatchController, MatchError, MatchOutcome};
pub use engine::{EngineConfig, EngineSpawner, GnugoSpawner, SpawnError};
pub use peer::{Peer, PeerError, PeerRole};
pub use session::{SessionError, run_session};
pub use transport::{Listener, TransportError};
