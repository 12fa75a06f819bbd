//! Line-mode player that binary-searches the secret over the text protocol.

use clap::Parser;
use log::{info, warn};
use shared::{ServerMessage, MAX_SECRET, MIN_SECRET};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:65432")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    info!("Connected to {}", args.server);
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let mut low = MIN_SECRET;
    let mut high = MAX_SECRET;
    let mut guess = (low + high) / 2;

    while let Some(line) = lines.next_line().await? {
        let message = match ServerMessage::parse(&line) {
            Some(message) => message,
            None => {
                warn!("Unrecognised line from server: {}", line);
                continue;
            }
        };
        info!("Server: {}", message);

        match message {
            ServerMessage::Welcome => {}
            ServerMessage::TooLow => low = guess + 1,
            ServerMessage::TooHigh => high = guess.saturating_sub(1),
            ServerMessage::InvalidGuess => {}
            ServerMessage::GameOver { winner, .. } => {
                info!("Round won by participant {}", winner);
                continue;
            }
            ServerMessage::NewRound => {
                info!("Round over, leaving");
                break;
            }
        }

        if low > high {
            warn!("Feedback was inconsistent, restarting search");
            low = MIN_SECRET;
            high = MAX_SECRET;
        }
        guess = low + (high - low) / 2;
        info!("Guessing {}", guess);
        writer.write_all(format!("{}\n", guess).as_bytes()).await?;
    }

    Ok(())
}
