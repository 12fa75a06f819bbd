//! Per-connection guess protocol.
//!
//! Each accepted connection is split in two. A writer task drains the
//! participant's outbox onto the socket, so broadcasts from other tasks never
//! wait on this socket. The handler itself owns the read half and runs the
//! guess loop until the participant wins, the round is taken by someone else,
//! or the transport goes away. Cleanup happens in one place,
//! [`handle_connection`], whatever the outcome.

use crate::client_manager::{Outbox, Participant};
use crate::error::ServerError;
use crate::game::{GuessOutcome, SharedGame};
use log::{debug, error, info, warn};
use shared::{parse_guess, ServerMessage, MAX_LINE_BYTES};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
};
use tokio::sync::mpsc;

/// How a participant's session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// This participant guessed the secret and ran the round transition.
    Won,
    /// The round ended under another participant before this one could finish.
    RoundSuperseded,
    /// The client closed its side of the connection.
    Disconnected,
}

/// Runs one participant from greeting to cleanup.
///
/// Registers the participant, plays the guess loop, then deregisters it and
/// waits for its queued messages to be flushed before the transport is
/// dropped. Errors are returned only after cleanup has run.
pub async fn handle_connection<S>(
    stream: S,
    id: u32,
    addr: SocketAddr,
    game: SharedGame,
    cooldown: Duration,
) -> Result<SessionEnd, ServerError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (outbox, outbox_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_outbox(writer, outbox_rx, id));

    game.add_participant(Participant::new(id, addr, outbox.clone()))
        .await;

    let mut session = GuessSession {
        id,
        attempts: 0,
        reader: BufReader::new(reader),
        outbox,
        game: game.clone(),
        cooldown,
    };
    let result = session.run().await;

    match &result {
        Ok(end) => info!(
            "Participant {} finished: {:?} after {} attempts",
            id, end, session.attempts
        ),
        Err(e) => warn!("Participant {} dropped: {}", id, e),
    }

    game.remove_participant(id).await;
    drop(session);

    match writer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Participant {} writer stopped: {}", id, e),
        Err(e) => error!("Participant {} writer task failed: {}", id, e),
    }

    result
}

/// Writes queued messages in order until every outbox sender is gone, then
/// shuts the write side down.
async fn write_outbox<W>(
    mut writer: W,
    mut outbox_rx: mpsc::UnboundedReceiver<ServerMessage>,
    id: u32,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbox_rx.recv().await {
        debug!("-> {}: {}", id, message);
        writer.write_all(message.to_line().as_bytes()).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

/// One read from the client side of the connection.
enum ClientLine {
    Guess(String),
    TooLong,
    Closed,
}

struct GuessSession<S> {
    id: u32,
    attempts: u32,
    reader: BufReader<ReadHalf<S>>,
    outbox: Outbox,
    game: SharedGame,
    cooldown: Duration,
}

impl<S> GuessSession<S>
where
    S: AsyncRead + AsyncWrite,
{
    async fn run(&mut self) -> Result<SessionEnd, ServerError> {
        self.send(ServerMessage::Welcome)?;

        loop {
            if !self.game.is_round_active().await {
                self.send(ServerMessage::NewRound)?;
                return Ok(SessionEnd::RoundSuperseded);
            }

            let line = match self.read_line().await? {
                ClientLine::Guess(line) => line,
                ClientLine::TooLong => {
                    debug!("Participant {} sent an over-long line", self.id);
                    self.send(ServerMessage::InvalidGuess)?;
                    continue;
                }
                ClientLine::Closed => return Ok(SessionEnd::Disconnected),
            };

            let guess = match parse_guess(&line) {
                Ok(guess) => guess,
                Err(e) => {
                    debug!("Participant {} sent invalid input: {}", self.id, e);
                    self.send(ServerMessage::InvalidGuess)?;
                    continue;
                }
            };

            self.attempts += 1;
            match self.game.evaluate_guess(guess).await {
                GuessOutcome::TooLow => self.send(ServerMessage::TooLow)?,
                GuessOutcome::TooHigh => self.send(ServerMessage::TooHigh)?,
                GuessOutcome::Correct { secret } => {
                    self.finish_round(secret).await;
                    return Ok(SessionEnd::Won);
                }
                GuessOutcome::RoundOver => {
                    self.send(ServerMessage::NewRound)?;
                    return Ok(SessionEnd::RoundSuperseded);
                }
            }
        }
    }

    /// Announces the win, waits out the cooldown and opens the next round.
    ///
    /// The round was already closed when the guess was evaluated. The lock is
    /// not held while sleeping.
    async fn finish_round(&mut self, secret: u32) {
        info!(
            "Participant {} guessed {} in {} attempts",
            self.id, secret, self.attempts
        );

        self.game
            .broadcast(&ServerMessage::GameOver {
                winner: self.id,
                secret,
                attempts: self.attempts,
            })
            .await;

        tokio::time::sleep(self.cooldown).await;

        self.game.start_new_round().await;
        self.game.broadcast(&ServerMessage::NewRound).await;
    }

    /// Reads one line from the client.
    ///
    /// A line that reaches the length limit without a terminator is dropped
    /// up to its `\n` and reported as `TooLong`, so it is never scored in
    /// pieces. Invalid UTF-8 is replaced rather than rejected, so it later
    /// fails guess parsing.
    async fn read_line(&mut self) -> Result<ClientLine, ServerError> {
        let mut buf = Vec::new();
        let read = (&mut self.reader)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut buf)
            .await?;

        if read == 0 {
            return Ok(ClientLine::Closed);
        }
        if read as u64 == MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
            self.discard_rest_of_line().await?;
            return Ok(ClientLine::TooLong);
        }
        Ok(ClientLine::Guess(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Skips input up to and including the next `\n`, or to end of stream.
    async fn discard_rest_of_line(&mut self) -> Result<(), ServerError> {
        loop {
            let (consumed, done) = {
                let available = self.reader.fill_buf().await?;
                if available.is_empty() {
                    return Ok(());
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(pos) => (pos + 1, true),
                    None => (available.len(), false),
                }
            };
            self.reader.consume(consumed);
            if done {
                return Ok(());
            }
        }
    }

    fn send(&self, message: ServerMessage) -> Result<(), ServerError> {
        self.outbox
            .send(message)
            .map_err(|_| ServerError::OutboxClosed { id: self.id })
    }
}
