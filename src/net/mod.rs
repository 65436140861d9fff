//! # Network Module
//!
//! Position-sync plumbing against the remote game server.
//!
//! Outgoing events are fire-and-forget emissions; incoming events land in a
//! queue that the session drains exactly once per tick on the main thread,
//! so board state is never mutated behind the game loop's back. The
//! transport itself sits behind the [`Relay`] trait: a JSON-lines TCP
//! implementation for real play, [`NullRelay`] for offline mode and
//! [`LoopbackRelay`] for tests.

pub mod api;

use crate::game::{EntityId, Position};
use crate::{DuskholdError, DuskholdResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::TcpStream;

/// A remote party member's visible state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePlayer {
    pub player_id: String,
    pub position: Position,
}

/// Events this client emits to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundEvent {
    Join { player_id: String, position: Position },
    Move { player_id: String, position: Position },
    ChestOpened { chest_id: EntityId },
    EnemyDied { enemy_id: EntityId },
}

/// Events the server pushes at this client. Party/chest/enemy sync events
/// are informational; combat stays locally authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundEvent {
    Joined { roster: Vec<RemotePlayer> },
    Moved { player_id: String, position: Position },
    Left { player_id: String },
    ChestOpened { chest_id: EntityId },
    EnemyDied { enemy_id: EntityId },
}

/// Abstract move/event relay to the game server.
pub trait Relay {
    /// Opens the connection. Failure leaves the relay in offline mode.
    fn connect(&mut self, host: &str, port: u16) -> DuskholdResult<()>;

    /// Emits one event, fire-and-forget. Callers log and ignore failures.
    fn emit(&mut self, event: &OutboundEvent) -> DuskholdResult<()>;

    /// Drains every event that arrived since the last call.
    fn drain(&mut self) -> Vec<InboundEvent>;

    fn is_connected(&self) -> bool;
}

/// Offline relay: emits vanish, nothing ever arrives.
#[derive(Debug, Default)]
pub struct NullRelay;

impl Relay for NullRelay {
    fn connect(&mut self, _host: &str, _port: u16) -> DuskholdResult<()> {
        Ok(())
    }

    fn emit(&mut self, _event: &OutboundEvent) -> DuskholdResult<()> {
        Ok(())
    }

    fn drain(&mut self) -> Vec<InboundEvent> {
        Vec::new()
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// In-memory relay for tests: records emissions, hands back whatever the
/// test queued up.
#[derive(Debug, Default)]
pub struct LoopbackRelay {
    pub sent: Vec<OutboundEvent>,
    inbound: VecDeque<InboundEvent>,
}

impl LoopbackRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event as if the server had pushed it.
    pub fn push_inbound(&mut self, event: InboundEvent) {
        self.inbound.push_back(event);
    }
}

impl Relay for LoopbackRelay {
    fn connect(&mut self, _host: &str, _port: u16) -> DuskholdResult<()> {
        Ok(())
    }

    fn emit(&mut self, event: &OutboundEvent) -> DuskholdResult<()> {
        self.sent.push(event.clone());
        Ok(())
    }

    fn drain(&mut self) -> Vec<InboundEvent> {
        self.inbound.drain(..).collect()
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// JSON-lines relay over TCP. Reads are non-blocking; partial lines stay
/// buffered until the newline arrives.
#[derive(Debug, Default)]
pub struct TcpRelay {
    stream: Option<TcpStream>,
    reader: Option<BufReader<TcpStream>>,
    partial: String,
}

impl TcpRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn disconnect(&mut self, reason: &str) {
        warn!("relay disconnected: {}", reason);
        self.stream = None;
        self.reader = None;
        self.partial.clear();
    }
}

impl Relay for TcpRelay {
    fn connect(&mut self, host: &str, port: u16) -> DuskholdResult<()> {
        let stream = TcpStream::connect((host, port))
            .map_err(|e| DuskholdError::NetUnavailable(format!("{}:{}: {}", host, port, e)))?;
        stream
            .set_nonblocking(true)
            .map_err(|e| DuskholdError::NetUnavailable(e.to_string()))?;
        let reader_stream = stream
            .try_clone()
            .map_err(|e| DuskholdError::NetUnavailable(e.to_string()))?;
        self.reader = Some(BufReader::new(reader_stream));
        self.stream = Some(stream);
        debug!("relay connected to {}:{}", host, port);
        Ok(())
    }

    fn emit(&mut self, event: &OutboundEvent) -> DuskholdResult<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(DuskholdError::NetUnavailable("not connected".to_string()));
        };
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        if let Err(e) = stream.write_all(line.as_bytes()) {
            self.disconnect(&e.to_string());
            return Err(DuskholdError::NetUnavailable(e.to_string()));
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        let Some(reader) = self.reader.as_mut() else {
            return events;
        };

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    self.disconnect("server closed the connection");
                    break;
                }
                Ok(_) => {
                    if !line.ends_with('\n') {
                        // Partial line; keep it for the next drain.
                        self.partial.push_str(&line);
                        break;
                    }
                    let full = if self.partial.is_empty() {
                        line
                    } else {
                        let mut full = std::mem::take(&mut self.partial);
                        full.push_str(&line);
                        full
                    };
                    match serde_json::from_str::<InboundEvent>(full.trim_end()) {
                        Ok(event) => events.push(event),
                        Err(e) => debug!("ignoring malformed relay event: {}", e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    // Bytes that arrived before the block stay buffered.
                    self.partial.push_str(&line);
                    break;
                }
                Err(e) => {
                    self.disconnect(&e.to_string());
                    break;
                }
            }
        }
        events
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
