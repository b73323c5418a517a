//! Client Module
//!
//! The chat client's half of the protocol plus the loop that drives it.
//!
//! ## Architecture
//! ```text
//!   stdin thread ──lines──┐
//!                         ├──► run() ──► ChatClient ──► ClientTransport
//!   reader thread ─events─┘
//! ```
//! Both inputs are merged with `select!`, so `ChatClient` never needs a lock.

mod session;

pub use session::{ChatClient, ExitReason, Flow};

use crossbeam::channel::{select, Receiver};

use crate::network::{ClientEvent, ClientTransport};
use crate::output::ChatOutput;

/// Drive a client until it exits
///
/// End of user input counts as `#quit`.
pub fn run<T: ClientTransport, O: ChatOutput>(
    client: &mut ChatClient<T, O>,
    input: &Receiver<String>,
    events: &Receiver<ClientEvent>,
) -> ExitReason {
    loop {
        let flow = select! {
            recv(input) -> line => match line {
                Ok(line) => client.handle_user_input(&line),
                Err(_) => {
                    tracing::debug!("User input closed");
                    client.quit()
                }
            },
            recv(events) -> event => match event {
                Ok(event) => client.handle_event(event),
                Err(_) => client.handle_event(ClientEvent::Exception(
                    "transport event channel closed".to_string(),
                )),
            },
        };

        if let Flow::Exit(reason) = flow {
            return reason;
        }
    }
}
