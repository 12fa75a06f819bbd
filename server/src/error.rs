//! Error types for the guessing-game server.

use std::net::SocketAddr;
use thiserror::Error;

/// Failures surfaced by the server library.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound; fatal at startup.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The configured host did not resolve to any usable address.
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from a participant's transport failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The participant's writer task has stopped, so nothing more can be sent.
    #[error("outbox for participant {id} is closed")]
    OutboxClosed { id: u32 },
}
