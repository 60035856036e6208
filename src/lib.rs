//! # boardd - Line-Protocol Bulletin Board Server
//!
//! boardd serves a shared public message board and a fixed set of named group
//! boards to any number of concurrent clients over a plain-text, line-oriented
//! TCP protocol.
//!
//! ## Features
//!
//! - **Public Board**: `%join`, `%post`, `%users`, `%message`, `%leave`
//! - **Group Boards**: `%groups`, `%groupjoin`, `%grouppost`, `%groupusers`,
//!   `%groupmessage`, `%groupleave`, resolved by group id or name
//! - **Task per Connection**: Built on Tokio; boards are shared behind per-board locks
//! - **Scoped Sessions**: Session state is released on every disconnect path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boardd::config::Config;
//! use boardd::bbs::BbsServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut server = BbsServer::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bbs`] - Protocol parser, sessions, command dispatch and the TCP server
//! - [`board`] - Board state and the registry of public and group boards
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Log sanitizing helpers
//! - [`metrics`] - Process-wide server counters

pub mod bbs;
pub mod board;
pub mod config;
pub mod logutil;
pub mod metrics;
