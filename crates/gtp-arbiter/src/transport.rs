//! Session transport factory.
//!
//! Produces connected peers in the two addressing modes: connect out to a
//! listening engine, or bind and accept a fixed number of inbound engine
//! connections. Pipe endpoints for spawned engines are wired up in the
//! engine module; everything downstream of `Peer` is transport-agnostic.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::channel::FramedChannel;
use crate::peer::{Peer, PeerRole};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("failed to accept peer connection: {0}")]
    Accept(#[from] io::Error),
}

/// Open an outbound connection and return a peer once the remote accepts.
pub async fn connect(host: &str, port: u16, role: PeerRole) -> Result<Peer, TransportError> {
    let addr = format!("{host}:{port}");
    tracing::debug!(%addr, %role, "Connecting to engine");

    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| TransportError::Connect {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(%addr, %role, "Connected");
    let (r, w) = stream.into_split();
    Ok(Peer::new(role, addr, FramedChannel::new(r, w)))
}

/// Connect with a bounded retry loop, for engines that are still binding
/// their listen socket after spawn.
pub async fn connect_with_retry(
    host: &str,
    port: u16,
    role: PeerRole,
    attempts: u32,
    delay: Duration,
) -> Result<Peer, TransportError> {
    let mut attempt = 1;
    loop {
        match connect(host, port, role).await {
            Ok(peer) => return Ok(peer),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                tracing::debug!(%role, attempt, error = %e, "Engine not accepting yet, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Listen-mode transport: bind once, then accept a fixed number of peers.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    pub async fn bind(host: &str, port: u16) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let inner = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept exactly `expected` inbound connections, sequentially.
    ///
    /// Peers are returned in acceptance order; the first accepted connection
    /// is assigned mover index 0. The match must not begin until all are
    /// connected.
    pub async fn accept_peers(&self, expected: usize) -> Result<Vec<Peer>, TransportError> {
        let mut peers = Vec::with_capacity(expected);
        for i in 0..expected {
            tracing::debug!(slot = i, "Waiting for engine connection");
            let (stream, remote) = self.inner.accept().await?;
            tracing::info!(slot = i, %remote, "Engine connected");
            let (r, w) = stream.into_split();
            peers.push(Peer::new(
                PeerRole::Engine(i),
                remote.to_string(),
                FramedChannel::new(r, w),
            ));
        }
        Ok(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn respond_name(mut stream: TcpStream, name: &'static str) {
        let mut buf = vec![0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"name\n");
        stream
            .write_all(format!("= {name}\n\n").as_bytes())
            .await
            .unwrap();
        // Hold the stream open until the peer is done with it.
        let _ = stream.read(&mut buf).await;
    }

    #[tokio::test]
    async fn accepts_peers_in_order_first_is_mover_zero() {
        let listener = Listener::bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let accept = tokio::spawn(async move { listener.accept_peers(2).await });

        let first = TcpStream::connect(addr).await.unwrap();
        tokio::spawn(respond_name(first, "first"));
        let second = TcpStream::connect(addr).await.unwrap();
        tokio::spawn(respond_name(second, "second"));

        let mut peers = accept.await.unwrap().unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].role(), PeerRole::Engine(0));
        assert_eq!(peers[1].role(), PeerRole::Engine(1));

        let resp = peers[0].send("name").await.unwrap();
        assert_eq!(protocol::trim_reply(resp.raw()), "first");
        let resp = peers[1].send("name").await.unwrap();
        assert_eq!(protocol::trim_reply(resp.raw()), "second");
    }

    #[tokio::test]
    async fn connect_reaches_a_listening_engine() {
        let listener = Listener::bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.inner.accept().await.unwrap();
            respond_name(stream, "engine").await;
        });

        let mut peer = connect("127.0.0.1", addr.port(), PeerRole::Server)
            .await
            .unwrap();
        let resp = peer.send("name").await.unwrap();
        assert_eq!(protocol::trim_reply(resp.raw()), "engine");
    }

    #[tokio::test]
    async fn connect_failure_names_the_address() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = Listener::bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port, PeerRole::Server)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(err.to_string().contains(&port.to_string()));
    }
}
