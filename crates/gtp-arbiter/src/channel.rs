//! Framed request/response channel over a raw byte-stream endpoint.
//!
//! Wraps one endpoint (process pipe pair or socket halves) behind the GTP
//! framing rule: send a newline-terminated command, then block until the
//! blank-line response terminator or stream closure. The termination command
//! is special-cased because the engine exits without replying to it.

use std::io;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::GtpCodec;
use crate::protocol;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Accumulated text of one reply. Owned by the caller of `send`, not
/// retained by the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    raw: String,
}

impl Response {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl From<String> for Response {
    fn from(raw: String) -> Self {
        Self { raw }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,
    #[error("peer closed the stream before a response terminator")]
    Disconnected,
    #[error("channel I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One request/response channel over an exclusively owned endpoint.
pub struct FramedChannel {
    reader: FramedRead<BoxedReader, GtpCodec>,
    writer: FramedWrite<BoxedWriter, GtpCodec>,
    open: bool,
}

impl FramedChannel {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            reader: FramedRead::new(Box::new(reader) as BoxedReader, GtpCodec::new()),
            writer: FramedWrite::new(Box::new(writer) as BoxedWriter, GtpCodec::new()),
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Write one command and read its framed reply.
    ///
    /// The command is newline-normalized before transmission. `quit` returns
    /// an empty response without reading and closes the channel, since the
    /// engine exits instead of framing a reply.
    pub async fn send(&mut self, command: &str) -> Result<Response, ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }

        self.writer.send(command.to_string()).await?;

        if is_quit(command) {
            tracing::debug!("Termination command sent, closing channel");
            self.open = false;
            return Ok(Response::empty());
        }

        match self.reader.next().await {
            Some(Ok(frame)) => Ok(Response::from(frame)),
            Some(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.open = false;
                Err(ChannelError::Disconnected)
            }
            Some(Err(e)) => {
                self.open = false;
                Err(ChannelError::Io(e))
            }
            None => {
                self.open = false;
                Err(ChannelError::Disconnected)
            }
        }
    }

    /// Mark the channel closed without dropping it.
    pub fn close(&mut self) {
        self.open = false;
    }
}

fn is_quit(command: &str) -> bool {
    command.strip_suffix('\n').unwrap_or(command) == protocol::QUIT
}
