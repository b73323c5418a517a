//! Tests for ChatServer
//!
//! These tests verify:
//! - Login binds an identity and announces it to everyone
//! - Duplicate and empty logins close the connection
//! - Nothing is relayed before login
//! - Nothing is processed after a connection is rejected
//! - Disconnect clears the identity so it can be reused
//! - Concurrent connections keep their own identities

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use common::MockRelay;
use simplechat::network::ConnectionHandler;
use simplechat::{ChatServer, ProtocolViolation};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (ChatServer, MockRelay) {
    (ChatServer::new(), MockRelay::default())
}

fn connect_and_login(server: &ChatServer, relay: &MockRelay, id: u64, identity: &str) {
    server.on_connected(relay, id);
    server.on_message(relay, id, &format!("#login {}", identity));
}

// =============================================================================
// Login Tests
// =============================================================================

#[test]
fn test_login_broadcasts_join_notice() {
    let (server, relay) = setup();

    connect_and_login(&server, &relay, 1, "alice");

    assert_eq!(relay.broadcasts(), vec!["alice has logged on."]);
    assert_eq!(server.identity(1).as_deref(), Some("alice"));
    assert!(relay.closed().is_empty());
}

#[test]
fn test_login_trims_identity() {
    let (server, relay) = setup();
    server.on_connected(&relay, 1);

    server.on_message(&relay, 1, "#login    alice   ");

    assert_eq!(server.identity(1).as_deref(), Some("alice"));
    assert_eq!(relay.broadcasts(), vec!["alice has logged on."]);
}

#[test]
fn test_duplicate_login_closes_and_keeps_identity() {
    let (server, relay) = setup();
    connect_and_login(&server, &relay, 1, "alice");

    server.on_message(&relay, 1, "#login mallory");

    assert_eq!(
        relay.sent_to(1),
        vec!["ERROR: You are already logged in. Connection terminated"]
    );
    assert_eq!(relay.closed(), vec![1]);
    assert_eq!(server.identity(1).as_deref(), Some("alice"));
    // Only the original join was announced
    assert_eq!(relay.broadcasts(), vec!["alice has logged on."]);
}

#[test]
fn test_nothing_processed_after_termination() {
    let (server, relay) = setup();
    server.on_connected(&relay, 1);

    // Lines the transport had already buffered when the close landed
    server.on_message(&relay, 1, "#login alice");
    server.on_message(&relay, 1, "#login eve");
    server.on_message(&relay, 1, "leaked after close");
    server.on_message(&relay, 1, "#login eve");

    assert_eq!(relay.broadcasts(), vec!["alice has logged on."]);
    assert_eq!(
        relay.sent_to(1),
        vec!["ERROR: You are already logged in. Connection terminated"]
    );
    assert_eq!(relay.closed(), vec![1]);
}

#[test]
fn test_empty_login_closes_without_binding() {
    for line in ["#login", "#login   ", "#login \t "] {
        let (server, relay) = setup();
        server.on_connected(&relay, 7);

        server.on_message(&relay, 7, line);

        assert_eq!(
            relay.sent_to(7),
            vec!["ERROR: Login ID not provided. Connection terminated"],
            "line {:?}",
            line
        );
        assert_eq!(relay.closed(), vec![7]);
        assert_eq!(server.identity(7), None);
        assert!(relay.broadcasts().is_empty());
    }
}

#[test]
fn test_handle_message_reports_violation_kind() {
    let (server, relay) = setup();
    server.on_connected(&relay, 1);

    assert_eq!(
        server.handle_message(&relay, 1, "hi"),
        Err(ProtocolViolation::NotLoggedIn)
    );
    assert_eq!(
        server.handle_message(&relay, 1, "#login"),
        Err(ProtocolViolation::MissingIdentity)
    );
    assert_eq!(server.handle_message(&relay, 1, "#login bob"), Ok(()));
    assert_eq!(
        server.handle_message(&relay, 1, "#login bob"),
        Err(ProtocolViolation::DuplicateLogin)
    );
}

// =============================================================================
// Chat Tests
// =============================================================================

#[test]
fn test_chat_before_login_is_rejected() {
    let (server, relay) = setup();
    server.on_connected(&relay, 2);

    server.on_message(&relay, 2, "hi");

    assert_eq!(
        relay.sent_to(2),
        vec!["ERROR: You must login before sending messages. Connection terminated"]
    );
    assert_eq!(relay.closed(), vec![2]);
    assert!(relay.broadcasts().is_empty());
}

#[test]
fn test_chat_after_login_is_relayed_to_everyone() {
    let (server, relay) = setup();
    connect_and_login(&server, &relay, 1, "alice");

    server.on_message(&relay, 1, "hello");

    assert_eq!(
        relay.broadcasts(),
        vec!["alice has logged on.", "alice> hello"]
    );
}

#[test]
fn test_other_hash_lines_are_relayed_as_chat() {
    let (server, relay) = setup();
    connect_and_login(&server, &relay, 1, "alice");

    server.on_message(&relay, 1, "#quit");

    assert_eq!(relay.broadcasts().last().unwrap(), "alice> #quit");
}

#[test]
fn test_unauthenticated_connection_does_not_disturb_others() {
    let (server, relay) = setup();
    connect_and_login(&server, &relay, 1, "alice");
    server.on_connected(&relay, 2);

    server.on_message(&relay, 2, "hi");
    server.on_message(&relay, 1, "still here");

    assert_eq!(relay.closed(), vec![2]);
    assert!(relay.sent_to(1).is_empty());
    assert_eq!(
        relay.broadcasts(),
        vec!["alice has logged on.", "alice> still here"]
    );
}

#[test]
fn test_message_without_connected_callback_is_still_gated() {
    let (server, relay) = setup();

    server.on_message(&relay, 9, "sneaky");

    assert_eq!(relay.closed(), vec![9]);
    assert!(relay.broadcasts().is_empty());
}

// =============================================================================
// Disconnect Tests
// =============================================================================

#[test]
fn test_disconnect_clears_identity() {
    let (server, relay) = setup();
    connect_and_login(&server, &relay, 1, "alice");
    assert_eq!(server.session_count(), 1);

    server.on_disconnected(&relay, 1);

    assert_eq!(server.identity(1), None);
    assert_eq!(server.session_count(), 0);
}

#[test]
fn test_identity_reusable_on_new_connection() {
    let (server, relay) = setup();
    connect_and_login(&server, &relay, 1, "alice");
    server.on_disconnected(&relay, 1);

    connect_and_login(&server, &relay, 2, "alice");

    assert_eq!(server.identity(2).as_deref(), Some("alice"));
    assert_eq!(
        relay.broadcasts(),
        vec!["alice has logged on.", "alice has logged on."]
    );
    assert!(relay.closed().is_empty());
}

#[test]
fn test_disconnect_of_unknown_connection_is_harmless() {
    let (server, relay) = setup();
    server.on_disconnected(&relay, 42);
    assert_eq!(server.session_count(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_connections_keep_own_identity() {
    let server = Arc::new(ChatServer::new());
    let relay = Arc::new(MockRelay::default());

    let handles: Vec<_> = (0..8u64)
        .map(|id| {
            let server = Arc::clone(&server);
            let relay = Arc::clone(&relay);
            thread::spawn(move || {
                let name = format!("user{}", id);
                connect_and_login(&server, &relay, id, &name);
                for i in 0..50 {
                    server.on_message(&*relay, id, &format!("msg {}", i));
                }
                server.on_disconnected(&*relay, id);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let broadcasts = relay.broadcasts();
    assert_eq!(broadcasts.len(), 8 * 51);
    assert!(relay.closed().is_empty());
    assert_eq!(server.session_count(), 0);

    // Per-sender order is preserved
    for id in 0..8u64 {
        let prefix = format!("user{}> ", id);
        let mine: Vec<&String> = broadcasts.iter().filter(|b| b.starts_with(&prefix)).collect();
        assert_eq!(mine.len(), 50);
        for (i, line) in mine.iter().enumerate() {
            assert_eq!(**line, format!("user{}> msg {}", id, i));
        }
    }
}
