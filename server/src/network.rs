//! Server network layer: TCP listener and per-connection task dispatch

use crate::config::ServerConfig;
use crate::connection::{handle_connection, SessionEnd};
use crate::error::ServerError;
use crate::game::{GameState, SharedGame};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Accepts participants and hands each one to its own task
pub struct Server {
    listener: TcpListener,
    game: SharedGame,
    config: ServerConfig,
    /// `None` once every id has been handed out
    next_participant_id: Option<u32>,
}

impl Server {
    /// Binds the listener with a fresh session
    ///
    /// Failing to bind is the only fatal error the server has.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        Self::with_game(config, SharedGame::new(GameState::new())).await
    }

    /// Binds the listener around an existing session
    pub async fn with_game(config: ServerConfig, game: SharedGame) -> Result<Self, ServerError> {
        let listener =
            TcpListener::bind(config.bind_addr)
                .await
                .map_err(|source| ServerError::Bind {
                    addr: config.bind_addr,
                    source,
                })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            game,
            config,
            next_participant_id: Some(1),
        })
    }

    /// Address actually bound, useful when the configured port was 0
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared session
    pub fn game(&self) -> SharedGame {
        self.game.clone()
    }

    /// Hands out the next participant id, or `None` when they are exhausted
    fn allocate_id(&mut self) -> Option<u32> {
        let id = self.next_participant_id?;
        self.next_participant_id = id.checked_add(1);
        Some(id)
    }

    /// Accepts connections forever
    ///
    /// Each participant gets the next id and an independent task; this loop
    /// never waits on a participant. Accept errors are logged and skipped.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!(
            "Waiting for connections (cooldown {:.1}s)",
            self.config.cooldown.as_secs_f32()
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = match self.allocate_id() {
                        Some(id) => id,
                        None => {
                            error!("Participant ids exhausted, refusing {}", addr);
                            continue;
                        }
                    };
                    info!("Connected by {} (participant {})", addr, id);

                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                    }

                    let game = self.game.clone();
                    let cooldown = self.config.cooldown;
                    tokio::spawn(async move {
                        match handle_connection(stream, id, addr, game, cooldown).await {
                            Ok(SessionEnd::Disconnected) => {
                                info!("Participant {} disconnected", id)
                            }
                            Ok(end) => info!("Participant {} session over: {:?}", id, end),
                            Err(e) => warn!("Participant {} ended with error: {}", id, e),
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
