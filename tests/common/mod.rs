//! Test utilities shared by the integration tests

#![allow(dead_code)]

use minisocks::codec::{ClientAuthOffer, ConnectRequest, PasswordReply, PasswordRequest, Reply, ServerAuthReply};
use minisocks::{AuthMethod, Command, ServerConfig, Socks5Server, TargetAddr};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Upper bound for any single step of a test exchange
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a proxy on an ephemeral loopback port and return its address
pub async fn spawn_proxy(config: ServerConfig) -> SocketAddr {
    let mut server = Socks5Server::new("127.0.0.1:0").with_config(config);
    let addr = server.bind().await.unwrap();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

/// Start a target that writes `response` to every client and closes
pub async fn spawn_fixed_response_target(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = stream.write_all(response).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

/// Start a target that echoes whatever it receives
pub async fn spawn_echo_target() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut rd, mut wr) = stream.into_split();
                let _ = tokio::io::copy(&mut rd, &mut wr).await;
            });
        }
    });

    addr
}

/// Start a target that reads a whole request, then answers with `response`
pub async fn spawn_reply_after_eof_target(response: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                if stream.read_to_end(&mut request).await.is_ok() {
                    let _ = stream.write_all(response).await;
                }
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

/// Find a loopback port with nothing listening on it
pub async fn closed_port_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub async fn connect(proxy: SocketAddr) -> TcpStream {
    tokio::time::timeout(STEP_TIMEOUT, TcpStream::connect(proxy))
        .await
        .unwrap()
        .unwrap()
}

/// Send a method offer and return the method the server picked
pub async fn offer(stream: &mut TcpStream, methods: &[AuthMethod]) -> AuthMethod {
    stream
        .write_all(&ClientAuthOffer::new(methods).encode())
        .await
        .unwrap();

    tokio::time::timeout(STEP_TIMEOUT, ServerAuthReply::read_from(stream))
        .await
        .unwrap()
        .unwrap()
        .method
}

/// Run the password sub-negotiation and return the reply
pub async fn login(stream: &mut TcpStream, username: &str, password: &str) -> PasswordReply {
    stream
        .write_all(&PasswordRequest::new(username, password).encode())
        .await
        .unwrap();

    tokio::time::timeout(STEP_TIMEOUT, PasswordReply::read_from(stream))
        .await
        .unwrap()
        .unwrap()
}

/// Send a request for `target` and return the server reply
pub async fn request(stream: &mut TcpStream, command: Command, target: SocketAddr) -> Reply {
    let address = match target {
        SocketAddr::V4(v4) => TargetAddr::Ipv4(*v4.ip()),
        SocketAddr::V6(v6) => TargetAddr::Ipv6(*v6.ip()),
    };
    let message = ConnectRequest::new(command, address, target.port());
    stream.write_all(&message.encode()).await.unwrap();

    tokio::time::timeout(STEP_TIMEOUT, Reply::read_from(stream))
        .await
        .unwrap()
        .unwrap()
}

/// Read until the peer closes. A reset counts as a close.
pub async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let result = tokio::time::timeout(STEP_TIMEOUT, stream.read_to_end(&mut received))
        .await
        .expect("connection was not closed");

    match result {
        Ok(_) => received,
        Err(e) if e.kind() == io::ErrorKind::ConnectionReset => received,
        Err(e) => panic!("unexpected read error: {e}"),
    }
}
