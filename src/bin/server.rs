//! SimpleChat Relay Binary
//!
//! Starts the chat relay and hands stdin to the operator console.

use std::sync::Arc;

use clap::Parser;
use simplechat::network::{ServerControl, TcpServer};
use simplechat::{ChatServer, ServerConfig, ServerConsole, StdoutOutput, DEFAULT_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// SimpleChat Relay
#[derive(Parser, Debug)]
#[command(name = "simplechat-server")]
#[command(about = "Login-gated chat relay with an operator console")]
#[command(version)]
struct Args {
    /// Listen port (falls back to 5555 if absent or not a number)
    port: Option<String>,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Socket write timeout in milliseconds (0 disables)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,simplechat=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let port = args
        .port
        .as_deref()
        .and_then(simplechat::config::parse_port)
        .unwrap_or(DEFAULT_PORT);

    tracing::info!("SimpleChat Relay v{}", simplechat::VERSION);

    let config = ServerConfig::builder()
        .bind_host(&args.host)
        .port(port)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let server = TcpServer::new(config, Arc::new(ChatServer::new()));

    if let Err(e) = server.listen() {
        tracing::error!("Could not listen for clients: {}", e);
        println!("ERROR - Could not listen for clients!");
        std::process::exit(1);
    }

    let output = StdoutOutput;
    let console = ServerConsole::new(&server, &output);
    if let Err(e) = console.run(std::io::stdin().lock()) {
        tracing::error!("Unexpected error while reading from console: {}", e);
        if let Err(e) = server.close() {
            tracing::warn!("Error closing relay: {}", e);
        }
    }

    tracing::info!("Relay stopped");
}
