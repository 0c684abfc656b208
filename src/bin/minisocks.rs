use anyhow::Result;
use clap::{Parser, ValueEnum};
use minisocks::{AuthMethod, ServerConfig, Socks5Server, UserTable};
use tracing::info;

/// Authentication mode offered to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AuthMode {
    /// No authentication
    None,
    /// Username/password authentication (RFC 1929)
    Password,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "A lightweight SOCKS5 proxy server", long_about = None)]
struct Args {
    /// Listener host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Listener port
    #[arg(short, long, default_value_t = 1080)]
    port: u16,

    /// Authentication mode
    #[arg(short, long, value_enum, default_value_t = AuthMode::None)]
    auth: AuthMode,

    /// Accepted credentials as user:pass, may be repeated
    #[arg(short, long = "user", value_name = "USER:PASS", value_parser = parse_user)]
    users: Vec<(String, String)>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_user(entry: &str) -> Result<(String, String), String> {
    UserTable::parse_pair(entry).ok_or_else(|| format!("expected USER:PASS, got {entry:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Initialize tracing subscriber
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match args.auth {
        AuthMode::None => ServerConfig::no_auth(),
        AuthMode::Password => {
            let users = UserTable::from_pairs(args.users);
            info!("Authentication enabled for {} user(s)", users.len());
            if users.is_empty() {
                // Rejected by run() as CredentialCheckerMissing
                ServerConfig {
                    auth_method: AuthMethod::Password,
                    credential_checker: None,
                }
            } else {
                ServerConfig::password(users)
            }
        }
    };

    // Instantiate server
    let listen_addr = format!("{}:{}", args.host, args.port);
    let mut server = Socks5Server::new(listen_addr).with_config(config);

    // Run it
    info!("Starting SOCKS5 proxy: {}", server.listen_addr);
    server.run().await
}
