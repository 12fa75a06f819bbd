//! Registry of connected participants for the guessing-game server
//!
//! This module tracks who is currently connected and how to reach them:
//! - Per-participant handles holding the outbox used to push lines to that connection
//! - Registration and idempotent removal keyed by participant id
//! - Snapshots of the recipient list for broadcasting
//!
//! The registry never performs I/O itself. Pushing into an outbox is a
//! non-blocking channel send; the connection's writer task does the socket work.

use log::{debug, info};
use shared::ServerMessage;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// Sending half of a participant's outgoing message queue
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Handle used to reach one connected participant
///
/// Cloning a handle clones the outbox sender; every clone delivers to the
/// same connection.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Sequence number assigned by the dispatcher, never reused
    pub id: u32,
    /// Peer address, kept for logging
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
    outbox: Outbox,
}

impl Participant {
    pub fn new(id: u32, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            outbox,
        }
    }

    /// Queues a message for this participant's connection
    ///
    /// Fails only when the connection's writer has already shut down.
    pub fn send(&self, message: ServerMessage) -> Result<(), ServerMessage> {
        self.outbox.send(message).map_err(|e| e.0)
    }
}

/// All currently registered participants indexed by id
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<u32, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
        }
    }

    /// Registers a participant and returns its id
    ///
    /// The participant is a broadcast target from this point on. Registering
    /// an id twice replaces the earlier handle.
    pub fn add(&mut self, participant: Participant) -> u32 {
        let id = participant.id;
        info!("Participant {} registered from {}", id, participant.addr);
        self.participants.insert(id, participant);
        id
    }

    /// Deregisters a participant
    ///
    /// Returns true if the participant was present. Removing an unknown id
    /// is a no-op.
    pub fn remove(&mut self, id: &u32) -> bool {
        match self.participants.remove(id) {
            Some(participant) => {
                info!(
                    "Participant {} removed after {:.1}s",
                    id,
                    participant.connected_at.elapsed().as_secs_f32()
                );
                true
            }
            None => {
                debug!("Participant {} was already removed", id);
                false
            }
        }
    }

    pub fn contains(&self, id: &u32) -> bool {
        self.participants.contains_key(id)
    }

    /// Clones every registered handle so delivery can happen outside the lock
    pub fn recipients(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    /// Returns the number of registered participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns true if nobody is registered
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
