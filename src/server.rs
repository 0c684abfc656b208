use crate::{auth, commands, config::ServerConfig, error::Result as Socks5Result, relay};
use anyhow::{Result, bail};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Socks5Server represents a SOCKS5 server and houses related
/// configuration data
pub struct Socks5Server {
    pub listen_addr: String,
    config: Arc<ServerConfig>,
    listener: Option<TcpListener>,
}

/// Socks5Server implementation block
impl Socks5Server {
    /// new is a constructor for the Socks5Server type; clients are accepted
    /// without authentication until a config is applied
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            config: Arc::new(ServerConfig::no_auth()),
            listener: None,
        }
    }

    /// with_config applies the authentication configuration
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        // Arc allows shared read-only access from every connection task
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// bind to the listen address; may only be called once
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            bail!("server is already bound to {}", self.listen_addr);
        }

        let listener = TcpListener::bind(&self.listen_addr).await?;
        let addr = listener.local_addr()?;

        info!("SOCKS5 proxy listening on {}", addr);

        self.listener = Some(listener);
        Ok(addr)
    }

    /// run validates the configuration, binds if needed and serves clients
    /// until the process exits
    pub async fn run(&mut self) -> Result<()> {
        self.config.validate()?;

        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => {
                self.bind().await?;
                match self.listener.take() {
                    Some(listener) => listener,
                    None => bail!("listener missing after bind"),
                }
            }
        };

        info!("authentication method: {}", self.config.auth_method);

        // Listen for connections to proxy
        loop {
            let (inbound, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                    continue;
                }
            };

            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                debug!("new client: {}", peer_addr);

                if let Err(e) = handle_connection(inbound, config).await {
                    error!("connection from {} failed: {}", peer_addr, e);
                }
            });
        }
    }
}

/// handle_connection runs one client through authentication, request
/// handling and relaying. The client socket is dropped, and so closed, on
/// every return path.
async fn handle_connection(mut stream: TcpStream, config: Arc<ServerConfig>) -> Socks5Result<()> {
    auth::negotiate_auth(&mut stream, &config).await?;

    let outbound = commands::handle_socks_request(&mut stream).await?;

    relay::forward(stream, outbound).await
}
