//! Runtime settings for the guessing-game server.

use crate::error::ServerError;
use shared::DEFAULT_PORT;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Pause between a win and the start of the next round.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: SocketAddr,
    /// How long the winner's task waits before starting the next round
    pub cooldown: Duration,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr, cooldown: Duration) -> Self {
        Self {
            bind_addr,
            cooldown,
        }
    }
}

/// Resolves a host name or IP literal plus port to the address to bind.
///
/// Bare IPv6 literals such as `::1` are accepted without brackets. The first
/// address the resolver returns is used.
pub async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let target = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    };

    let resolve_error = |source| ServerError::Resolve {
        host: host.to_string(),
        source,
    };
    let addr = tokio::net::lookup_host(&target)
        .await
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| {
            resolve_error(io::Error::new(
                io::ErrorKind::NotFound,
                "no addresses returned",
            ))
        });
    addr
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}
