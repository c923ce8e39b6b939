//! In-process transport session.
//!
//! [`session`] returns a [`MemoryTransport`] for the client side and a
//! [`MemoryPeer`] standing in for the remote device. The peer can answer
//! requests, publish notifications and observe how often the client opened and
//! closed its session.
//!
//! Every connect starts a new generation. Requests carry the generation they
//! were sent on and the peer's replies carry the generation of the last request
//! it received, so a reply to a request from an earlier connection is dropped
//! by the client instead of answering a later call. Published notifications are
//! not tied to a request and are always delivered.

use crate::error::transport::TransportError;
use crate::transport::{Multipart, SessionMode, Transport};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, timeout as TokioTimeout};

#[derive(Debug, Default)]
struct SessionStats {
    connects: AtomicUsize,
    closes: AtomicUsize,
    connected: AtomicBool,
    refusing: AtomicBool,
    generation: AtomicU64,
}

/// One multipart message in flight, tagged with the connection generation it
/// belongs to. `None` marks messages not bound to a connection.
#[derive(Debug)]
struct Tagged {
    generation: Option<u64>,
    parts: Multipart,
}

pub struct MemoryTransport {
    address: String,
    mode: SessionMode,
    to_peer: UnboundedSender<Tagged>,
    from_peer: UnboundedReceiver<Tagged>,
    stats: Arc<SessionStats>,
}

pub struct MemoryPeer {
    to_client: UnboundedSender<Tagged>,
    from_client: UnboundedReceiver<Tagged>,
    reply_generation: Option<u64>,
    stats: Arc<SessionStats>,
}

/// Create a connected pair of client session and remote peer.
pub fn session(address: &str, mode: SessionMode) -> (MemoryTransport, MemoryPeer) {
    let (to_peer, from_client) = mpsc::unbounded_channel();
    let (to_client, from_peer) = mpsc::unbounded_channel();
    let stats = Arc::new(SessionStats::default());

    let transport = MemoryTransport {
        address: address.to_string(),
        mode,
        to_peer,
        from_peer,
        stats: Arc::clone(&stats),
    };
    let peer = MemoryPeer {
        to_client,
        from_client,
        reply_generation: None,
        stats,
    };
    (transport, peer)
}

impl MemoryTransport {
    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.stats.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::NotConnected {
                message: format!("Session to {} is not connected", self.address),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}

impl Transport for MemoryTransport {
    fn address(&self) -> &str {
        &self.address
    }

    fn mode(&self) -> SessionMode {
        self.mode
    }

    fn is_connected(&self) -> bool {
        self.stats.connected.load(Ordering::SeqCst)
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.stats.refusing.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                address: self.address.clone(),
                message: "Peer refused the connection".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if !self.stats.connected.swap(true, Ordering::SeqCst) {
            self.stats.connects.fetch_add(1, Ordering::SeqCst);
            self.stats.generation.fetch_add(1, Ordering::SeqCst);
            info!("Connected {:?} session to {}", self.mode, self.address);
        }
        Ok(())
    }

    async fn send(&mut self, message: Multipart) -> Result<(), TransportError> {
        if self.mode == SessionMode::Subscribe {
            return Err(TransportError::Send {
                message: format!("Session to {} is subscribe-only", self.address),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.ensure_connected()?;

        let tagged = Tagged {
            generation: Some(self.stats.generation.load(Ordering::SeqCst)),
            parts: message,
        };
        self.to_peer.send(tagged).map_err(|_| TransportError::Closed {
            message: format!("Peer {} is gone", self.address),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Multipart>, TransportError> {
        self.ensure_connected()?;

        let current = self.stats.generation.load(Ordering::SeqCst);
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match TokioTimeout(remaining, self.from_peer.recv()).await {
                Ok(Some(Tagged {
                    generation: Some(generation),
                    ..
                })) if generation != current => {
                    debug!(
                        "Dropped reply from {} for connection {} (current {})",
                        self.address, generation, current
                    );
                }
                Ok(Some(tagged)) => return Ok(Some(tagged.parts)),
                Ok(None) => {
                    return Err(TransportError::Closed {
                        message: format!("Peer {} is gone", self.address),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Err(_) => return Ok(None),
            }
        }
    }

    async fn close(&mut self) {
        if self.stats.connected.swap(false, Ordering::SeqCst) {
            // A closed session loses whatever the peer had in flight.
            while self.from_peer.try_recv().is_ok() {}
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
            info!("Disconnected from {}", self.address);
        }
    }
}

impl MemoryPeer {
    /// Next message sent by the client, or `None` once the client is dropped.
    pub async fn recv(&mut self) -> Option<Multipart> {
        let tagged = self.from_client.recv().await?;
        Some(self.accept(tagged))
    }

    pub fn try_recv(&mut self) -> Option<Multipart> {
        let tagged = self.from_client.try_recv().ok()?;
        Some(self.accept(tagged))
    }

    fn accept(&mut self, tagged: Tagged) -> Multipart {
        self.reply_generation = tagged.generation;
        tagged.parts
    }

    /// Deliver a reply or notification to the client.
    ///
    /// Once a request has been received, messages answer that request's
    /// connection and are discarded if the client has reconnected since.
    pub fn send(&self, message: Multipart) -> Result<(), TransportError> {
        let tagged = Tagged {
            generation: self.reply_generation,
            parts: message,
        };
        self.to_client.send(tagged).map_err(|_| TransportError::Closed {
            message: "Client session is gone".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// How many times the client opened the session.
    pub fn connects(&self) -> usize {
        self.stats.connects.load(Ordering::SeqCst)
    }

    /// How many times the client closed the session.
    pub fn closes(&self) -> usize {
        self.stats.closes.load(Ordering::SeqCst)
    }

    /// Make later connect attempts by the client fail (or succeed again).
    pub fn refuse_connects(&self, refuse: bool) {
        self.stats.refusing.store(refuse, Ordering::SeqCst);
    }

    pub fn is_client_connected(&self) -> bool {
        self.stats.connected.load(Ordering::SeqCst)
    }
}
