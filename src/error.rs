//! Error types for the SOCKS5 server

use crate::protocol::{AuthMethod, ReplyCode};
use std::io;
use thiserror::Error;

/// Result alias used by the protocol engine
pub type Result<T> = std::result::Result<T, Socks5Error>;

/// Socks5Error covers everything that can end a connection, plus the
/// configuration errors caught at startup
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Client spoke a SOCKS version other than 5
    #[error("unsupported SOCKS version: {0}")]
    VersionMismatch(u8),

    /// Password sub-negotiation version was not 1
    #[error("unsupported sub-negotiation version: {0}")]
    SubnegotiationVersionMismatch(u8),

    /// Unknown or unserviced command
    #[error("command not supported: {0}")]
    CommandNotSupported(u8),

    /// RSV byte was not zero
    #[error("invalid reserved field: {0}")]
    ReservedFieldInvalid(u8),

    /// Unknown or unserviced address type
    #[error("address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Client did not offer the configured method
    #[error("no acceptable authentication method")]
    NoAcceptableMethod,

    /// Credential check rejected the client
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Password auth configured without a credential checker
    #[error("password authentication selected but no credential checker configured")]
    CredentialCheckerMissing,

    /// Configured method the server cannot service
    #[error("authentication method not supported by this server: {0}")]
    UnsupportedAuthMethod(AuthMethod),

    /// Resolving or dialing the target failed
    #[error("connection to {target} failed: {source}")]
    ConnectionRefused {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Transport failure: short reads, resets, closed sockets
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Socks5Error {
    /// reply_code is the REP code reported to the client when this error is
    /// raised by the request resolver
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Socks5Error::CommandNotSupported(_) => Some(ReplyCode::CommandNotSupported),
            Socks5Error::AddressTypeNotSupported(_) => Some(ReplyCode::AddressTypeNotSupported),
            Socks5Error::ConnectionRefused { .. } => Some(ReplyCode::ConnectionRefused),
            _ => None,
        }
    }
}
