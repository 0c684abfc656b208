//! A lightweight SOCKS5 proxy server library
//!
//! ## SOCKS5 Implementation
//!
//! - Features:
//!     - CONNECT to IPv4 and domain name targets
//!     - No Authentication
//!     - Username/Password Authentication through a pluggable [`CredentialChecker`]
//!     - Async using tokio, one task per client connection
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)
//! - [Username/Password Authentication (RFC 1929)](https://datatracker.ietf.org/doc/html/rfc1929)
//!
//! # Example
//! ```no_run
//! use minisocks::{ServerConfig, Socks5Server, UserTable};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let users = UserTable::from_pairs([("admin", "123456")]);
//!     let mut server = Socks5Server::new("127.0.0.1:1080")
//!         .with_config(ServerConfig::password(users));
//!     server.run().await
//! }
//! ```

pub mod address;
pub mod auth;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod server;

// Re-export main types at crate root for convenience
pub use address::TargetAddr;
pub use auth::{CredentialChecker, UserPass, UserTable};
pub use config::ServerConfig;
pub use error::Socks5Error;
pub use protocol::{AddressType, AuthMethod, Command, ReplyCode};
pub use server::Socks5Server;
