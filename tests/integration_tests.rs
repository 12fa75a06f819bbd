//! Integration tests for the guessing-game server
//!
//! These tests run the real listener on an ephemeral port and drive it with
//! plain TCP clients speaking the line protocol.

use server::{GameState, Server, ServerConfig, SharedGame};
use shared::ServerMessage;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const COOLDOWN: Duration = Duration::from_millis(50);
const READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Starts a server with a fixed first secret and returns its address and session.
async fn start_server(secret: u32) -> (SocketAddr, SharedGame) {
    start_server_with_cooldown(secret, COOLDOWN).await
}

async fn start_server_with_cooldown(secret: u32, cooldown: Duration) -> (SocketAddr, SharedGame) {
    let config = ServerConfig::new(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), cooldown);
    let game = SharedGame::new(GameState::with_secret(secret));
    let server = Server::with_game(config, game.clone())
        .await
        .expect("failed to bind test server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, game)
}

struct Player {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Player {
    /// Connects and consumes the welcome line, so the player is registered on return.
    async fn join(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut player = Player {
            lines: BufReader::new(reader).lines(),
            writer,
        };
        let welcome = player.read_line().await.expect("no welcome line");
        assert!(welcome.contains("Welcome to the multiplayer guessing game!"));
        assert!(welcome.contains("between 1 and 100"));
        player
    }

    async fn guess(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn read_line(&mut self) -> Option<String> {
        timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for the server")
            .unwrap_or(None)
    }

    async fn expect(&mut self) -> ServerMessage {
        let line = self.read_line().await.expect("connection closed");
        ServerMessage::parse(&line).unwrap_or_else(|| panic!("unexpected line {:?}", line))
    }
}

async fn wait_for_participants(game: &SharedGame, count: usize) {
    for _ in 0..200 {
        if game.participant_count().await == count {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} participants, found {}",
        count,
        game.participant_count().await
    );
}

/// GUESS PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// Two participants, the first wins on its second guess
    #[tokio::test]
    async fn winner_and_watcher_see_the_same_round_end() {
        let (addr, game) = start_server(42).await;
        let mut first = Player::join(addr).await;
        let mut second = Player::join(addr).await;
        assert!(game.is_registered(1).await);
        assert!(game.is_registered(2).await);

        first.guess("10").await;
        let feedback = first.read_line().await.unwrap();
        assert_eq!(feedback, "Too low! Try a higher number.");

        first.guess("42").await;
        let win = first.read_line().await.unwrap();
        assert!(win.contains("GAME OVER!"));
        assert!(win.contains("Congratulations!"));
        assert!(win.contains("42"));
        assert!(win.contains("2 attempts"));

        let watched = second.read_line().await.unwrap();
        assert_eq!(watched, win);
        let notice = second.read_line().await.unwrap();
        assert!(notice.contains("A new game has started!"));

        assert_eq!(first.expect().await, ServerMessage::NewRound);
        assert_eq!(first.read_line().await, None);

        assert!(game.is_round_active().await);
        assert_eq!(game.round().await, 2);
        wait_for_participants(&game, 1).await;
    }

    /// Too-high feedback only reaches the guesser
    #[tokio::test]
    async fn feedback_is_private() {
        let (addr, _game) = start_server(42).await;
        let mut guesser = Player::join(addr).await;
        let mut bystander = Player::join(addr).await;

        guesser.guess("99").await;
        assert_eq!(guesser.expect().await, ServerMessage::TooHigh);

        bystander.guess("41").await;
        assert_eq!(bystander.expect().await, ServerMessage::TooLow);
    }

    /// Non-numeric input is rejected without counting as an attempt
    #[tokio::test]
    async fn invalid_input_is_not_an_attempt() {
        let (addr, game) = start_server(42).await;
        let mut player = Player::join(addr).await;

        player.guess("abc").await;
        assert_eq!(
            player.read_line().await.unwrap(),
            "Please enter a valid number between 1 and 100."
        );
        assert!(game.is_round_active().await);
        assert_eq!(game.current_secret().await, 42);

        player.guess("42").await;
        assert_eq!(
            player.expect().await,
            ServerMessage::GameOver {
                winner: 1,
                secret: 42,
                attempts: 1
            }
        );
    }

    /// The next round is playable by participants that stayed connected
    #[tokio::test]
    async fn next_round_uses_the_new_secret() {
        let (addr, game) = start_server(42).await;
        let mut first = Player::join(addr).await;
        let mut second = Player::join(addr).await;

        first.guess("42").await;
        assert!(matches!(second.expect().await, ServerMessage::GameOver { .. }));
        assert_eq!(second.expect().await, ServerMessage::NewRound);

        let secret = game.current_secret().await;
        assert!((1..=100).contains(&secret));

        second.guess(&secret.to_string()).await;
        assert_eq!(
            second.expect().await,
            ServerMessage::GameOver {
                winner: 2,
                secret,
                attempts: 1
            }
        );
    }
}

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    /// A closed connection is deregistered and later broadcasts skip it
    #[tokio::test]
    async fn disconnect_mid_round_leaves_one_recipient() {
        let (addr, game) = start_server(42).await;
        let mut stays = Player::join(addr).await;
        let leaves = Player::join(addr).await;
        assert_eq!(game.participant_count().await, 2);

        drop(leaves);
        wait_for_participants(&game, 1).await;
        assert!(game.is_registered(1).await);
        assert!(!game.is_registered(2).await);

        assert_eq!(game.broadcast(&ServerMessage::NewRound).await, 1);
        assert_eq!(stays.expect().await, ServerMessage::NewRound);
        assert!(game.is_round_active().await);
    }

    /// Ids keep increasing and are never reused after a disconnect
    #[tokio::test]
    async fn participant_ids_are_not_reused() {
        let (addr, game) = start_server(42).await;
        let first = Player::join(addr).await;
        drop(first);
        wait_for_participants(&game, 0).await;

        let mut second = Player::join(addr).await;
        assert!(game.is_registered(2).await);

        second.guess("42").await;
        assert_eq!(
            second.expect().await,
            ServerMessage::GameOver {
                winner: 2,
                secret: 42,
                attempts: 1
            }
        );
    }

    /// Joining during the cooldown ends the new session with a new-round notice
    #[tokio::test]
    async fn joining_during_cooldown_is_superseded() {
        let (addr, game) = start_server_with_cooldown(42, Duration::from_millis(500)).await;
        let mut winner = Player::join(addr).await;

        winner.guess("42").await;
        assert!(matches!(winner.expect().await, ServerMessage::GameOver { .. }));
        assert!(!game.is_round_active().await);

        let mut late = Player::join(addr).await;
        assert_eq!(late.expect().await, ServerMessage::NewRound);
        assert_eq!(late.read_line().await, None);

        assert_eq!(winner.expect().await, ServerMessage::NewRound);
        assert!(game.is_round_active().await);
    }
}
