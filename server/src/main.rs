use clap::Parser;
use log::info;
use server::config::resolve_bind_addr;
use server::{Server, ServerConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host name or IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait between a win and the next round
    #[arg(short, long, default_value = "3")]
    cooldown_secs: u64,
}

/// Parses arguments, binds the listener and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let bind_addr = resolve_bind_addr(&args.host, args.port).await?;
    let config = ServerConfig::new(bind_addr, Duration::from_secs(args.cooldown_secs));

    info!("Server starting...");
    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
