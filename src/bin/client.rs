//! SimpleChat Client Binary
//!
//! Line-based chat client: type to chat, `#` for commands.

use std::io::BufRead;
use std::thread;

use clap::Parser;
use crossbeam::channel::unbounded;
use simplechat::network::TcpClient;
use simplechat::{client, ChatClient, ClientConfig, ExitReason, Flow, StdoutOutput};
use simplechat::{DEFAULT_HOST, DEFAULT_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// SimpleChat Client
#[derive(Parser, Debug)]
#[command(name = "simplechat-client")]
#[command(about = "Chat client for a SimpleChat relay")]
#[command(version)]
struct Args {
    /// Login ID announced to the relay
    login_id: String,

    /// Relay host
    #[arg(default_value = DEFAULT_HOST)]
    host: String,

    /// Relay port (falls back to 5555 if not a number)
    port: Option<String>,
}

fn main() {
    // Logs go to stderr at warn so they stay out of the chat
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let port = args
        .port
        .as_deref()
        .and_then(simplechat::config::parse_port)
        .unwrap_or(DEFAULT_PORT);

    let config = ClientConfig::builder()
        .login_id(&args.login_id)
        .host(&args.host)
        .port(port)
        .build();

    let (transport, events) = TcpClient::channel();
    let mut chat = match ChatClient::new(config, transport, StdoutOutput) {
        Ok(chat) => chat,
        Err(e) => {
            println!("ERROR - {}. Connection aborted.", e);
            std::process::exit(1);
        }
    };

    if let Flow::Exit(reason) = chat.connect() {
        std::process::exit(reason.code());
    }

    // stdin blocks, so it gets its own thread feeding the run loop
    let (input_tx, input_rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if input_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Unexpected error while reading from console: {}", e);
                        break;
                    }
                }
            }
        });

    let reason = match spawned {
        Ok(_) => client::run(&mut chat, &input_rx, &events),
        Err(e) => {
            tracing::error!("Could not start input thread: {}", e);
            chat.quit();
            ExitReason::Fatal
        }
    };

    // Close the socket before exiting so the relay sees a clean disconnect
    drop(chat);
    std::process::exit(reason.code());
}
