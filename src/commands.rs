use crate::codec::{ConnectRequest, Reply};
use crate::error::{Result, Socks5Error};
use crate::protocol::{AddressType, Command, ReplyCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// handle_socks_request reads the client request, applies the server policy
/// and dials the target. On success the outbound stream is returned for
/// relaying.
///
/// Exactly one reply is written unless the request itself is malformed, in
/// which case the decode error is returned and nothing is written.
pub async fn handle_socks_request<S>(stream: &mut S) -> Result<TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = ConnectRequest::read_from(stream).await?;
    debug!("{} request for {}", request.command, request.target());

    // Check command and route
    match request.command {
        Command::Connect => {}
        Command::Bind | Command::UdpAssociate => {
            let err = Socks5Error::CommandNotSupported(request.command.into());
            return reject(stream, err).await;
        }
    }

    // IPv6 targets are refused by policy
    match request.address_type() {
        AddressType::IPv4 | AddressType::DomainName => {}
        AddressType::IPv6 => {
            let err = Socks5Error::AddressTypeNotSupported(request.address_type().into());
            return reject(stream, err).await;
        }
    }

    handle_connect_cmd(stream, &request).await
}

// ================
// CONNECT COMMAND
// ================

/// handle_connect_cmd dials the requested target once and reports the
/// outcome. The success reply carries the proxy's own local endpoint of the
/// outbound connection.
async fn handle_connect_cmd<S>(stream: &mut S, request: &ConnectRequest) -> Result<TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let target = request.target();

    // Resolution and dial failures all map to ConnectionRefused
    let outbound = match TcpStream::connect(&target).await {
        Ok(outbound) => outbound,
        Err(e) => {
            return reject(stream, Socks5Error::ConnectionRefused { target, source: e }).await;
        }
    };

    let bound = match outbound.local_addr() {
        Ok(addr) => addr,
        Err(e) => return reject(stream, e.into()).await,
    };

    Reply::success(bound).write_to(stream).await?;
    info!("connected to {target} via {bound}");

    Ok(outbound)
}

/// reject writes the failure reply matching `err` and returns it
async fn reject<S, T>(stream: &mut S, err: Socks5Error) -> Result<T>
where
    S: AsyncWrite + Unpin,
{
    let code = err.reply_code().unwrap_or(ReplyCode::ServerFailure);
    Reply::failure(code).write_to(stream).await?;
    Err(err)
}
