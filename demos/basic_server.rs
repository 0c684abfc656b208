//! Basic SOCKS5 server example

use minisocks::{ServerConfig, Socks5Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut server = Socks5Server::new("127.0.0.1:1080").with_config(ServerConfig::no_auth());
    println!("Starting SOCKS5 server on 127.0.0.1:1080");

    server.run().await
}
