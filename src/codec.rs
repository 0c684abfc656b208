//! SOCKS5 wire messages
//!
//! Every message knows how to decode itself from an async reader and encode
//! itself to bytes. Multi-byte fields are big-endian and every read consumes
//! exactly the number of bytes the message declares, so a short read surfaces
//! as an IO error rather than a protocol error.
//!
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)
//! - [Username/Password Authentication (RFC 1929)](https://datatracker.ietf.org/doc/html/rfc1929)

use crate::address::TargetAddr;
use crate::error::{Result, Socks5Error};
use crate::protocol::{
    AddressType, AuthMethod, AuthStatus, Command, RSV, ReplyCode, SOCKS5_VERSION,
    SUBNEGOTIATION_VERSION,
};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// write_message writes an encoded message and flushes the stream
async fn write_message<W>(writer: &mut W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// ClientAuthOffer is the client greeting listing the methods it supports
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAuthOffer {
    /// Raw method bytes, in the order offered; may contain values this
    /// server does not know
    pub methods: Vec<u8>,
}

impl ClientAuthOffer {
    pub fn new(methods: &[AuthMethod]) -> Self {
        Self {
            methods: methods.iter().map(|&m| u8::from(m)).collect(),
        }
    }

    pub fn offers(&self, method: AuthMethod) -> bool {
        self.methods.contains(&u8::from(method))
    }

    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 2];
        reader.read_exact(&mut header).await?;

        let version = header[0];
        if version != SOCKS5_VERSION {
            return Err(Socks5Error::VersionMismatch(version));
        }

        let mut methods = vec![0u8; header[1] as usize];
        reader.read_exact(&mut methods).await?;

        Ok(Self { methods })
    }

    pub fn encode(&self) -> Vec<u8> {
        let methods = &self.methods[..self.methods.len().min(255)];

        let mut buf = Vec::with_capacity(2 + methods.len());
        buf.push(SOCKS5_VERSION);
        buf.push(methods.len() as u8);
        buf.extend_from_slice(methods);
        buf
    }
}

/// ServerAuthReply carries the method chosen by the server
///
/// ```text
/// +----+--------+
/// |VER | METHOD |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerAuthReply {
    pub method: AuthMethod,
}

impl ServerAuthReply {
    pub fn encode(&self) -> [u8; 2] {
        [SOCKS5_VERSION, u8::from(self.method)]
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        write_message(writer, &self.encode()).await
    }

    /// read_from decodes the reply on the client side; unknown method bytes
    /// are reported as NoAcceptable
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await?;

        if buf[0] != SOCKS5_VERSION {
            return Err(Socks5Error::VersionMismatch(buf[0]));
        }

        let method = AuthMethod::from_byte(buf[1]).unwrap_or(AuthMethod::NoAcceptable);
        Ok(Self { method })
    }
}

/// PasswordRequest is the RFC 1929 username/password message
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordRequest {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs
impl std::fmt::Debug for PasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl PasswordRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 2];
        reader.read_exact(&mut header).await?;

        let version = header[0];
        if version != SUBNEGOTIATION_VERSION {
            return Err(Socks5Error::SubnegotiationVersionMismatch(version));
        }

        let mut username = vec![0u8; header[1] as usize];
        reader.read_exact(&mut username).await?;

        let password_len = reader.read_u8().await?;
        let mut password = vec![0u8; password_len as usize];
        reader.read_exact(&mut password).await?;

        // Non UTF-8 credentials cannot match a configured pair; decode lossily
        // and let the credential check reject them
        Ok(Self {
            username: String::from_utf8_lossy(&username).into_owned(),
            password: String::from_utf8_lossy(&password).into_owned(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let username = &self.username.as_bytes()[..self.username.len().min(255)];
        let password = &self.password.as_bytes()[..self.password.len().min(255)];

        let mut buf = Vec::with_capacity(3 + username.len() + password.len());
        buf.push(SUBNEGOTIATION_VERSION);
        buf.push(username.len() as u8);
        buf.extend_from_slice(username);
        buf.push(password.len() as u8);
        buf.extend_from_slice(password);
        buf
    }
}

/// PasswordReply is the server's answer to a PasswordRequest
///
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordReply {
    pub status: AuthStatus,
}

impl PasswordReply {
    pub fn encode(&self) -> [u8; 2] {
        [SUBNEGOTIATION_VERSION, self.status as u8]
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        write_message(writer, &self.encode()).await
    }

    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await?;

        if buf[0] != SUBNEGOTIATION_VERSION {
            return Err(Socks5Error::SubnegotiationVersionMismatch(buf[0]));
        }

        Ok(Self {
            status: AuthStatus::from_byte(buf[1]),
        })
    }
}

/// ConnectRequest is the client request following authentication
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub command: Command,
    pub address: TargetAddr,
    pub port: u16,
}

impl ConnectRequest {
    pub fn new(command: Command, address: TargetAddr, port: u16) -> Self {
        Self {
            command,
            address,
            port,
        }
    }

    pub fn address_type(&self) -> AddressType {
        self.address.address_type()
    }

    /// target returns the dialable host:port of the request
    pub fn target(&self) -> String {
        self.address.authority(self.port)
    }

    /// read_from validates version, command, reserved byte and address type,
    /// in that order, before any address bytes are consumed
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).await?;

        let [version, command, reserved, addr_type] = header;

        if version != SOCKS5_VERSION {
            return Err(Socks5Error::VersionMismatch(version));
        }

        let command =
            Command::from_byte(command).ok_or(Socks5Error::CommandNotSupported(command))?;

        if reserved != RSV {
            return Err(Socks5Error::ReservedFieldInvalid(reserved));
        }

        let addr_type = AddressType::from_byte(addr_type)
            .ok_or(Socks5Error::AddressTypeNotSupported(addr_type))?;

        let address = TargetAddr::read_from(reader, addr_type).await?;
        let port = reader.read_u16().await?;

        Ok(Self {
            command,
            address,
            port,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![
            SOCKS5_VERSION,
            u8::from(self.command),
            RSV,
            u8::from(self.address_type()),
        ];
        self.address.write_to(&mut buf);
        buf.extend_from_slice(&self.port.to_be_bytes());
        buf
    }
}

/// Reply answers a ConnectRequest; exactly one is written per request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub code: ReplyCode,
    pub bound: SocketAddr,
}

impl Reply {
    pub fn success(bound: SocketAddr) -> Self {
        Self {
            code: ReplyCode::Succeeded,
            bound,
        }
    }

    /// failure replies always carry a zero-filled IPv4 address and port
    pub fn failure(code: ReplyCode) -> Self {
        Self {
            code,
            bound: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![SOCKS5_VERSION, u8::from(self.code), RSV];

        match self.bound {
            SocketAddr::V4(addr) => {
                buf.push(u8::from(AddressType::IPv4));
                buf.extend_from_slice(&addr.ip().octets());
            }
            SocketAddr::V6(addr) => {
                buf.push(u8::from(AddressType::IPv6));
                buf.extend_from_slice(&addr.ip().octets());
            }
        }
        buf.extend_from_slice(&self.bound.port().to_be_bytes());

        buf
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        write_message(writer, &self.encode()).await
    }

    /// read_from decodes a server reply on the client side. Domain-typed
    /// bound addresses are not produced by this server and are rejected.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).await?;

        let [version, code, reserved, addr_type] = header;

        if version != SOCKS5_VERSION {
            return Err(Socks5Error::VersionMismatch(version));
        }
        if reserved != RSV {
            return Err(Socks5Error::ReservedFieldInvalid(reserved));
        }

        let code = ReplyCode::from_byte(code).unwrap_or(ReplyCode::ServerFailure);

        let ip = match AddressType::from_byte(addr_type) {
            Some(AddressType::IPv4) => {
                let mut octets = [0u8; 4];
                reader.read_exact(&mut octets).await?;
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            Some(AddressType::IPv6) => {
                let mut octets = [0u8; 16];
                reader.read_exact(&mut octets).await?;
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            Some(AddressType::DomainName) | None => {
                return Err(Socks5Error::AddressTypeNotSupported(addr_type));
            }
        };
        let port = reader.read_u16().await?;

        Ok(Self {
            code,
            bound: SocketAddr::new(ip, port),
        })
    }
}
