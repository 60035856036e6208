//! Exact-bytes transcripts against a scripted stream: every reply must be
//! CRLF-terminated and arrive in request order.
use boardd::bbs::{handle_connection, CommandProcessor, ConnectionSettings, Session};
use tokio_test::io::Builder;
mod common;
use common::default_registry;

#[tokio::test]
async fn transcript_public_board() {
    let mock = Builder::new()
        .read(b"%join bob\r\n")
        .write(b"bob has joined the bulletin board.\r\n")
        .read(b"%post bob 2024-01-01 Hello World\r\n")
        .write(b"Message posted with ID 1\r\n")
        .read(b"%message 1\r\n")
        .write(b"Subject: Hello\nContent: World\r\n")
        .read(b"%exit\r\n")
        .write(b"Goodbye!\r\n")
        .build();

    let processor = CommandProcessor::new(default_registry());
    handle_connection(mock, Session::new("1".into(), "mock".into()), processor, ConnectionSettings::default())
        .await
        .expect("transcript");
}

#[tokio::test]
async fn transcript_accepts_bare_newlines() {
    let mock = Builder::new()
        .read(b"%users\n")
        .write(b"No users in the group.\r\n")
        .read(b"%frobnicate now\n")
        .write(b"Unknown command.\r\n")
        .build();

    let processor = CommandProcessor::new(default_registry());
    handle_connection(mock, Session::new("2".into(), "mock".into()), processor, ConnectionSettings::default())
        .await
        .expect("transcript");
}

#[tokio::test]
async fn transcript_survives_parse_error() {
    let mock = Builder::new()
        .read(b"%message x1\r\n")
        .write(b"Error: Invalid parameters.\r\n")
        .read(b"%groups\r\n")
        .write(b"ID: 1, Name: Group Alpha\nID: 2, Name: Group Beta\nID: 3, Name: Group Gamma\nID: 4, Name: Group Delta\nID: 5, Name: Group Epsilon\r\n")
        .build();

    let processor = CommandProcessor::new(default_registry());
    handle_connection(mock, Session::new("3".into(), "mock".into()), processor, ConnectionSettings::default())
        .await
        .expect("transcript");
}
