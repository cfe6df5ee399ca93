//! Interactive terminal client for the relay.
//!
//! Every line typed on stdin is sent as one message; every message the
//! relay broadcasts (our own included) is printed as `<< message`.
//!
//! - `RELAY_CLIENT_ADDR` (default: "127.0.0.1:4000")
//! - `RELAY_FRAMING`     (default: "length"; must match the server)

use std::env;

use anyhow::{Context, Result};
use relay_protocol::Framing;
use relay_server::transport::{write_message, MessageReader};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<()> {
    let addr = env::var("RELAY_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:4000".to_string());
    let framing = match env::var("RELAY_FRAMING") {
        Ok(value) => value.parse::<Framing>()?,
        Err(_) => Framing::default(),
    };

    println!("Connecting to {} ({} framing)...", addr, framing);
    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    println!("Connected. Type a message and press enter; 'quit' or 'exit' to leave.\n");

    let (read_half, mut write_half) = stream.into_split();
    let mut inbound = MessageReader::new(read_half, framing);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            message = inbound.read_message() => {
                match message? {
                    Some(text) => println!("<< {text}"),
                    None => {
                        println!("Relay closed the connection.");
                        break;
                    }
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    println!("\nEOF on stdin, exiting client.");
                    break;
                };

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
                    println!("Exiting client.");
                    break;
                }

                write_message(&mut write_half, framing, trimmed).await?;
            }
        }
    }

    let _ = write_half.shutdown().await;
    Ok(())
}
