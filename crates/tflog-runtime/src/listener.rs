//! UDP log listener.
//!
//! Receives datagrams, decodes each into a line and feeds it to a
//! [`LogHandler`]. The loop never stops on bad input: receive errors and
//! malformed lines are logged and the next datagram is read. Handlers run on
//! their own tasks, so a slow handler does not delay receiving.

use std::io;
use std::net::SocketAddr;

use tflog_framework::{LogHandler, Origin};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::config::ListenerConfig;
use crate::datagram;
use crate::error::{RuntimeError, RuntimeResult};

/// A bound UDP socket receiving game server log lines.
#[derive(Debug)]
pub struct UdpListener {
    socket: UdpSocket,
    buffer_size: usize,
}

impl UdpListener {
    /// Binds the socket described by `config`.
    pub async fn bind(config: &ListenerConfig) -> RuntimeResult<Self> {
        let addr = config.bind_addr();
        let socket = UdpSocket::bind(&addr)
            .await
            .map_err(|source| RuntimeError::Bind {
                addr: addr.clone(),
                source,
            })?;

        let listener = Self {
            socket,
            buffer_size: config.buffer_size,
        };
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, buffer_size = listener.buffer_size, "UDP listener bound");
        }
        Ok(listener)
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives until `shutdown` is cancelled.
    pub async fn run(self, engine: LogHandler, shutdown: CancellationToken) {
        let mut buf = vec![0u8; self.buffer_size];

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };

            match received {
                Ok((len, peer)) => Self::handle_datagram(&engine, peer, &buf[..len]),
                Err(e) => warn!(error = %e, "Failed to receive datagram"),
            }
        }

        info!("UDP listener stopped");
    }

    fn handle_datagram(engine: &LogHandler, peer: SocketAddr, bytes: &[u8]) {
        trace!(peer = %peer, len = bytes.len(), "Datagram received");

        let Some(line) = datagram::decode(bytes) else {
            trace!(peer = %peer, "Empty datagram");
            return;
        };

        if let Err(e) = engine.on_line(Origin::new(peer), &line) {
            warn!(peer = %peer, error = %e, line = %line, "Malformed log line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tflog_core::{MalformedFieldPolicy, SayEvent};
    use tflog_framework::Context;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn loopback() -> ListenerConfig {
        ListenerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bind_error() {
        let first = UdpListener::bind(&loopback()).await.unwrap();
        let taken = ListenerConfig {
            port: first.local_addr().unwrap().port(),
            ..loopback()
        };

        let err = UdpListener::bind(&taken).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_receives_and_dispatches() {
        let engine = LogHandler::with_catalog(MalformedFieldPolicy::FallThrough).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = engine.subscribe(move |ctx: Context, event: SayEvent| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((ctx.peer(), event.message));
            }
        });

        let listener = UdpListener::bind(&loopback()).await.unwrap();
        let target = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(listener.run(engine, shutdown.clone()));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender_addr = sender.local_addr().unwrap();
        sender.send_to(b"\xFF\xFF\xFF\xFF", target).await.unwrap();
        sender
            .send_to(b"\xFF\xFF\xFF\xFFRL 10/18/2026 - 21:04:11: Server cvars start\n\0", target)
            .await
            .unwrap();
        sender
            .send_to(
                b"\xFF\xFF\xFF\xFFRL 10/18/2026 - 21:04:12: \"Alice<23><STEAM_0:1:111><Red>\" say \"gg\"\n\0",
                target,
            )
            .await
            .unwrap();

        let (peer, message) = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(peer, sender_addr);
        assert_eq!(message, "gg");

        shutdown.cancel();
        timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_cancelled() {
        let engine = LogHandler::new(MalformedFieldPolicy::FallThrough);
        let listener = UdpListener::bind(&loopback()).await.unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        timeout(Duration::from_secs(1), listener.run(engine, shutdown))
            .await
            .unwrap();
    }
}
