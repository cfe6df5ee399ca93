//! Binary TCP server for the chat relay.

use anyhow::{Context, Result};
use clap::Parser;
use relay_protocol::Framing;

use relay_server::config::{Config, LogFormat};
use relay_server::logger;
use relay_server::Server;

#[derive(Parser, Debug)]
#[command(name = "relay-server", version)]
#[command(about = "Minimal multi-client TCP chat relay")]
struct Cli {
    /// TCP port to listen on (overrides RELAY_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind (overrides RELAY_BIND_ADDR)
    #[arg(short, long)]
    bind_addr: Option<String>,

    /// Message framing: `length` or `line` (overrides RELAY_FRAMING)
    #[arg(short, long)]
    framing: Option<Framing>,

    /// Log output: `tracing` or `console` (overrides RELAY_LOG_FORMAT)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn apply_to(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind_addr) = self.bind_addr {
            config.bind_addr = bind_addr;
        }
        if let Some(framing) = self.framing {
            config.framing = framing;
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("invalid relay configuration")?;
    cli.apply_to(&mut config);

    if config.log_format == LogFormat::Tracing {
        logger::init_tracing("info");
    }

    let server = Server::new(config.framing, logger::for_format(config.log_format));
    server.start(&config.socket_addr_string()).await;

    Ok(())
}
