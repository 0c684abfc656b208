use crate::auth::CredentialChecker;
use crate::error::{Result, Socks5Error};
use crate::protocol::AuthMethod;
use std::fmt;
use std::sync::Arc;

/// ServerConfig is fixed at startup and shared read-only by every
/// connection handler behind an Arc
#[derive(Clone)]
pub struct ServerConfig {
    pub auth_method: AuthMethod,
    pub credential_checker: Option<Arc<dyn CredentialChecker>>,
}

/// ServerConfig implementation block
impl ServerConfig {
    /// no_auth accepts clients without authentication
    pub fn no_auth() -> Self {
        Self {
            auth_method: AuthMethod::NoAuth,
            credential_checker: None,
        }
    }

    /// password requires RFC 1929 authentication checked by `checker`
    pub fn password(checker: impl CredentialChecker + 'static) -> Self {
        Self {
            auth_method: AuthMethod::Password,
            credential_checker: Some(Arc::new(checker)),
        }
    }

    /// validate rejects configurations the server cannot honor
    pub fn validate(&self) -> Result<()> {
        match self.auth_method {
            AuthMethod::NoAuth => Ok(()),
            AuthMethod::Password if self.credential_checker.is_none() => {
                Err(Socks5Error::CredentialCheckerMissing)
            }
            AuthMethod::Password => Ok(()),
            method @ (AuthMethod::Gssapi | AuthMethod::NoAcceptable) => {
                Err(Socks5Error::UnsupportedAuthMethod(method))
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::no_auth()
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("auth_method", &self.auth_method)
            .field("credential_checker", &self.credential_checker.is_some())
            .finish()
    }
}
