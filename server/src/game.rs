//! Shared session state: the live secret, the round flag and the participant
//! registry.
//!
//! [`GameState`] is the plain data with its rules. [`SharedGame`] wraps it in a
//! single `RwLock` and is what connection tasks hold. The lock is only taken
//! around state reads and mutations; message delivery happens after it is
//! released.

use crate::client_manager::{Participant, ParticipantRegistry};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ServerMessage, MAX_SECRET, MIN_SECRET};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of checking one guess against the live secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    TooLow,
    TooHigh,
    /// The guess was right and this caller now owns the win.
    Correct { secret: u32 },
    /// No round is live; someone else already won.
    RoundOver,
}

#[derive(Debug)]
pub struct GameState {
    secret: u32,
    round_active: bool,
    round: u64,
    participants: ParticipantRegistry,
    rng: StdRng,
}

impl GameState {
    /// Creates a session with an entropy-seeded generator and starts round 1.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a session whose secrets come from a seeded generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates a session whose first round uses `secret`.
    ///
    /// Later rounds draw from an entropy-seeded generator as usual.
    ///
    /// # Panics
    ///
    /// Panics if `secret` is outside the guessable range.
    pub fn with_secret(secret: u32) -> Self {
        assert!(
            (MIN_SECRET..=MAX_SECRET).contains(&secret),
            "secret {} outside {}..={}",
            secret,
            MIN_SECRET,
            MAX_SECRET
        );
        let mut state = Self::new();
        state.secret = secret;
        state
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut state = Self {
            secret: MIN_SECRET,
            round_active: false,
            round: 0,
            participants: ParticipantRegistry::new(),
            rng,
        };
        state.start_new_round();
        state
    }

    /// Picks a fresh secret in the inclusive range and reopens guessing.
    pub fn start_new_round(&mut self) {
        self.secret = self.rng.gen_range(MIN_SECRET..=MAX_SECRET);
        self.round_active = true;
        self.round += 1;
        info!("Round {} started", self.round);
        debug!("Round {} secret is {}", self.round, self.secret);
    }

    pub fn end_round(&mut self) {
        if self.round_active {
            self.round_active = false;
            info!("Round {} ended", self.round);
        }
    }

    pub fn is_round_active(&self) -> bool {
        self.round_active
    }

    /// Only meaningful while the round is active.
    pub fn current_secret(&self) -> u32 {
        self.secret
    }

    /// Number of the current (or most recently ended) round, starting at 1.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Compares a guess to the secret.
    ///
    /// A correct guess ends the round before returning, so exactly one caller
    /// sees `Correct` per round.
    pub fn evaluate_guess(&mut self, guess: i64) -> GuessOutcome {
        if !self.round_active {
            return GuessOutcome::RoundOver;
        }

        let secret = i64::from(self.secret);
        if guess < secret {
            GuessOutcome::TooLow
        } else if guess > secret {
            GuessOutcome::TooHigh
        } else {
            self.end_round();
            GuessOutcome::Correct {
                secret: self.secret,
            }
        }
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    pub fn participants_mut(&mut self) -> &mut ParticipantRegistry {
        &mut self.participants
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to the one session every connection task shares.
#[derive(Debug, Clone)]
pub struct SharedGame {
    inner: Arc<RwLock<GameState>>,
}

impl SharedGame {
    pub fn new(state: GameState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn start_new_round(&self) {
        self.inner.write().await.start_new_round();
    }

    pub async fn end_round(&self) {
        self.inner.write().await.end_round();
    }

    pub async fn is_round_active(&self) -> bool {
        self.inner.read().await.is_round_active()
    }

    pub async fn current_secret(&self) -> u32 {
        self.inner.read().await.current_secret()
    }

    pub async fn round(&self) -> u64 {
        self.inner.read().await.round()
    }

    pub async fn evaluate_guess(&self, guess: i64) -> GuessOutcome {
        self.inner.write().await.evaluate_guess(guess)
    }

    /// Registers a participant; it receives every broadcast from now on.
    pub async fn add_participant(&self, participant: Participant) -> u32 {
        self.inner.write().await.participants_mut().add(participant)
    }

    /// Deregisters a participant. Unknown ids are ignored.
    pub async fn remove_participant(&self, id: u32) -> bool {
        self.inner.write().await.participants_mut().remove(&id)
    }

    pub async fn is_registered(&self, id: u32) -> bool {
        self.inner.read().await.participants().contains(&id)
    }

    pub async fn participant_count(&self) -> usize {
        self.inner.read().await.participants().len()
    }

    /// Sends `message` to every registered participant and returns how many
    /// accepted it.
    ///
    /// The recipient list is snapshotted under the lock; delivery happens
    /// after releasing it. A recipient whose connection is gone is logged and
    /// skipped. It stays registered until its own task removes it.
    pub async fn broadcast(&self, message: &ServerMessage) -> usize {
        let recipients = {
            let state = self.inner.read().await;
            state.participants().recipients()
        };

        let mut delivered = 0;
        for recipient in recipients {
            match recipient.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(
                    "Failed to deliver broadcast to participant {} ({})",
                    recipient.id, recipient.addr
                ),
            }
        }

        debug!("Broadcast {:?} reached {} participants", message, delivered);
        delivered
    }
}
