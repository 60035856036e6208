//! # BBS Protocol Core
//!
//! The session and command engine of the board server.
//!
//! ## Components
//!
//! - [`parser`] - Turns a raw line into a [`parser::Command`]
//! - [`session`] - Per-connection state (username, joined groups)
//! - [`commands`] - Dispatch of each command against the shared boards
//! - [`server`] - TCP accept loop and the per-connection task
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  BbsServer      │ ← Accepts connections, one task each
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Session        │ ← Owned by the connection task
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Command        │ ← Parse, validate, mutate/query boards
//! │  Processing     │
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  BoardRegistry  │ ← Shared public board + group boards
//! └─────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! One CRLF-terminated UTF-8 line per request and per reply. Verbs start with
//! `%` and are case-sensitive; arguments are whitespace separated.

pub mod commands;
pub mod parser;
pub mod server;
pub mod session;

pub use commands::{CommandError, CommandProcessor, Reply};
pub use parser::{Command, CommandParser};
pub use server::{handle_connection, BbsServer, ConnectionSettings};
pub use session::Session;
