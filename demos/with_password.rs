//! SOCKS5 server with username/password authentication example

use minisocks::{ServerConfig, Socks5Server, UserTable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let users = UserTable::from_pairs([("<user>", "<pass>")]);
    let mut server = Socks5Server::new("127.0.0.1:1080").with_config(ServerConfig::password(users));

    server.run().await
}
