//! # Guessing Game Server Library
//!
//! This library provides the server side of a multiplayer number-guessing
//! game. One secret number is shared by every connected participant; the
//! first to guess it wins the round for everybody, and a new round starts
//! after a short cooldown.
//!
//! ## Core Responsibilities
//!
//! ### Shared Session
//! The server holds the only copy of the secret, the round-in-progress flag
//! and the registry of connected participants. All of it sits behind one
//! lock, so a round transition is never observed half-applied.
//!
//! ### Participant Management
//! Handles the complete lifecycle of a connection:
//! - Sequence-number assignment on accept
//! - Registration as a broadcast target
//! - Deregistration and transport close exactly once, whatever ended the session
//!
//! ### Broadcasting
//! Win announcements and new-round notices go to every registered
//! participant. A participant whose connection is gone is skipped and logged;
//! it never stops delivery to the others.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! The dispatcher spawns one tokio task per accepted connection on the
//! multi-threaded runtime. Each connection also gets a writer task fed by an
//! unbounded outbox, so pushing a broadcast never blocks on a slow socket and
//! the session lock is never held across network I/O.
//!
//! ### Line Protocol
//! Plain TCP carrying newline-terminated UTF-8 text. Clients send one integer
//! guess per line; the server answers with the lines defined in the `shared`
//! crate.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Participant handles and the registry keyed by participant id.
//!
//! ### Game Module (`game`)
//! The secret, round flag and rules, plus the lock-wrapped handle shared by
//! all tasks.
//!
//! ### Connection Module (`connection`)
//! The per-participant guess loop, its writer task and cleanup.
//!
//! ### Network Module (`network`)
//! TCP listener, id assignment and task dispatch.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Listen on 127.0.0.1:65432 with a 3 second cooldown between rounds
//!     let server = Server::bind(ServerConfig::default()).await?;
//!
//!     // Accept participants until the process is stopped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod network;

pub use config::ServerConfig;
pub use connection::SessionEnd;
pub use error::ServerError;
pub use game::{GameState, GuessOutcome, SharedGame};
pub use network::Server;
