//! Line-oriented text protocol spoken between the guessing-game server and
//! its clients.
//!
//! Every server message is a single UTF-8 line terminated by `\n`. Clients
//! send one guess per line. [`ServerMessage`] is the tagged set of message
//! kinds; [`ServerMessage::to_line`] renders one for the wire and
//! [`ServerMessage::parse`] classifies a received line back into its kind.

use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

/// Smallest number the server will ever pick.
pub const MIN_SECRET: u32 = 1;
/// Largest number the server will ever pick.
pub const MAX_SECRET: u32 = 100;
/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 65432;
/// Longest client line the server reads in one go.
pub const MAX_LINE_BYTES: u64 = 1024;

const WIN_PREFIX: &str = "GAME OVER! Congratulations! Client ";

/// Every kind of line the server sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Sent once to a freshly connected client.
    Welcome,
    /// The guess was below the secret.
    TooLow,
    /// The guess was above the secret.
    TooHigh,
    /// The line did not contain an integer.
    InvalidGuess,
    /// Round-end marker and win announcement, broadcast to everyone.
    GameOver {
        winner: u32,
        secret: u32,
        attempts: u32,
    },
    /// A fresh secret is live.
    NewRound,
}

impl ServerMessage {
    /// Renders the message as a newline-terminated wire line.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }

    /// Classifies a line received from the server.
    ///
    /// Trailing whitespace (including the line terminator) is ignored.
    /// Returns `None` for lines that are not part of the protocol.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();

        if let Some(rest) = line.strip_prefix(WIN_PREFIX) {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if tokens.len() != 8 || tokens[1..4] != ["guessed", "the", "number"] {
                return None;
            }
            return Some(ServerMessage::GameOver {
                winner: tokens[0].parse().ok()?,
                secret: tokens[4].parse().ok()?,
                attempts: tokens[6].parse().ok()?,
            });
        }

        [
            ServerMessage::Welcome,
            ServerMessage::TooLow,
            ServerMessage::TooHigh,
            ServerMessage::InvalidGuess,
            ServerMessage::NewRound,
        ]
        .into_iter()
        .find(|kind| kind.to_string() == line)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => write!(
                f,
                "Welcome to the multiplayer guessing game! I'm thinking of a number between {} and {}.",
                MIN_SECRET, MAX_SECRET
            ),
            ServerMessage::TooLow => write!(f, "Too low! Try a higher number."),
            ServerMessage::TooHigh => write!(f, "Too high! Try a lower number."),
            ServerMessage::InvalidGuess => write!(
                f,
                "Please enter a valid number between {} and {}.",
                MIN_SECRET, MAX_SECRET
            ),
            ServerMessage::GameOver {
                winner,
                secret,
                attempts,
            } => write!(
                f,
                "{}{} guessed the number {} in {} attempts!",
                WIN_PREFIX, winner, secret, attempts
            ),
            ServerMessage::NewRound => write!(
                f,
                "A new game has started! I'm thinking of a number between {} and {}.",
                MIN_SECRET, MAX_SECRET
            ),
        }
    }
}

/// A client line that could not be read as a guess.
#[derive(Debug, Error)]
#[error("not a number: {input:?}")]
pub struct GuessError {
    pub input: String,
    #[source]
    pub source: ParseIntError,
}

/// Parses one client line as a guess, ignoring surrounding whitespace.
///
/// Any integer is accepted, including ones outside the secret range.
pub fn parse_guess(line: &str) -> Result<i64, GuessError> {
    let trimmed = line.trim();
    trimmed.parse::<i64>().map_err(|source| GuessError {
        input: trimmed.to_string(),
        source,
    })
}
