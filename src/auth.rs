use crate::codec::{ClientAuthOffer, PasswordReply, PasswordRequest, ServerAuthReply};
use crate::config::ServerConfig;
use crate::error::{Result, Socks5Error};
use crate::protocol::{AuthMethod, AuthStatus};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// CredentialChecker decides whether a username/password pair is accepted.
/// The server only calls it; storing credentials is up to the implementor.
pub trait CredentialChecker: Send + Sync {
    fn check(&self, username: &str, password: &str) -> bool;
}

impl<F> CredentialChecker for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn check(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

/// UserPass holds a single username/password pair as dictated
/// server-side
#[derive(Clone)]
pub struct UserPass {
    pub username: String,
    pub password: String,
}

impl UserPass {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl CredentialChecker for UserPass {
    fn check(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// UserTable maps usernames to their passwords
#[derive(Clone, Default)]
pub struct UserTable {
    users: HashMap<String, String>,
}

impl UserTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: pairs
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    /// parse_pair splits a `user:pass` entry at the first colon
    pub fn parse_pair(entry: &str) -> Option<(String, String)> {
        let (username, password) = entry.split_once(':')?;
        if username.is_empty() {
            return None;
        }
        Some((username.to_string(), password.to_string()))
    }

    pub fn insert(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), password.into());
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialChecker for UserTable {
    fn check(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}

/// negotiate_auth handles authentication negotiation between the SOCKS server
/// and client, returning the agreed method.
///
/// The configured method is the only one the server accepts. If the client
/// does not offer it, `NoAcceptable` is written and the connection fails.
/// With password auth the RFC 1929 sub-negotiation follows; nothing else is
/// read or written for no-auth.
pub async fn negotiate_auth<S>(stream: &mut S, config: &ServerConfig) -> Result<AuthMethod>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // A malformed greeting gets no response at all
    let offer = ClientAuthOffer::read_from(stream).await?;
    debug!("client offered auth methods {:?}", offer.methods);

    let method = config.auth_method;
    let checker = match method {
        AuthMethod::NoAuth => None,
        AuthMethod::Password => Some(
            config
                .credential_checker
                .as_ref()
                .ok_or(Socks5Error::CredentialCheckerMissing)?,
        ),
        other => return Err(Socks5Error::UnsupportedAuthMethod(other)),
    };

    if !offer.offers(method) {
        let reply = ServerAuthReply {
            method: AuthMethod::NoAcceptable,
        };
        if let Err(e) = reply.write_to(stream).await {
            debug!("failed to send no-acceptable reply: {e}");
        }
        return Err(Socks5Error::NoAcceptableMethod);
    }

    ServerAuthReply { method }.write_to(stream).await?;

    if let Some(checker) = checker {
        authenticate_userpass(stream, &**checker).await?;
    }

    Ok(method)
}

/// authenticate_userpass runs the username/password sub-negotiation
async fn authenticate_userpass<S>(stream: &mut S, checker: &dyn CredentialChecker) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = PasswordRequest::read_from(stream).await?;

    if !checker.check(&request.username, &request.password) {
        warn!("authentication rejected for user {:?}", request.username);
        let reply = PasswordReply {
            status: AuthStatus::Failure,
        };
        if let Err(e) = reply.write_to(stream).await {
            debug!("failed to send authentication failure: {e}");
        }
        return Err(Socks5Error::AuthenticationFailed);
    }

    PasswordReply {
        status: AuthStatus::Success,
    }
    .write_to(stream)
    .await?;

    debug!("authenticated user {:?}", request.username);
    Ok(())
}
