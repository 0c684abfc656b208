use crate::error::Result;
use crate::protocol::AddressType;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// TargetAddr represents a network address or domain to be used as the
/// SOCKS5 target address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ipv4(Ipv4Addr),
    Domain(String),
    Ipv6(Ipv6Addr),
}

/// TargetAddr implementation block
impl TargetAddr {
    pub fn address_type(&self) -> AddressType {
        match self {
            TargetAddr::Ipv4(_) => AddressType::IPv4,
            TargetAddr::Domain(_) => AddressType::DomainName,
            TargetAddr::Ipv6(_) => AddressType::IPv6,
        }
    }

    /// host returns the address as a string: dotted IPv4, IPv6 literal
    /// or the domain name as sent by the client
    pub fn host(&self) -> String {
        match self {
            TargetAddr::Ipv4(ip) => ip.to_string(),
            TargetAddr::Domain(domain) => domain.clone(),
            TargetAddr::Ipv6(ip) => ip.to_string(),
        }
    }

    /// authority renders a dialable host:port string
    pub fn authority(&self, port: u16) -> String {
        match self {
            TargetAddr::Ipv6(ip) => format!("[{ip}]:{port}"),
            _ => format!("{}:{port}", self.host()),
        }
    }

    /// read_from parses the DST.ADDR field for an already validated
    /// address type, consuming exactly the bytes that type declares
    pub async fn read_from<R>(reader: &mut R, addr_type: AddressType) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let addr = match addr_type {
            AddressType::IPv4 => {
                let mut octets = [0u8; 4];
                reader.read_exact(&mut octets).await?;
                TargetAddr::Ipv4(Ipv4Addr::from(octets))
            }
            AddressType::DomainName => {
                // First octet in DomainName contains the number of
                // octets to follow
                let len = reader.read_u8().await?;
                let mut domain = vec![0u8; len as usize];
                reader.read_exact(&mut domain).await?;
                // Names that are not UTF-8 never resolve; the dial reports them
                TargetAddr::Domain(String::from_utf8_lossy(&domain).into_owned())
            }
            AddressType::IPv6 => {
                let mut octets = [0u8; 16];
                reader.read_exact(&mut octets).await?;
                TargetAddr::Ipv6(Ipv6Addr::from(octets))
            }
        };

        Ok(addr)
    }

    /// write_to appends the DST.ADDR field (without ATYP) to buf
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            TargetAddr::Ipv4(ip) => buf.extend_from_slice(&ip.octets()),
            TargetAddr::Domain(domain) => {
                // Length is a single octet; longer names are cut at 255 bytes
                let bytes = &domain.as_bytes()[..domain.len().min(u8::MAX as usize)];
                buf.push(bytes.len() as u8);
                buf.extend_from_slice(bytes);
            }
            TargetAddr::Ipv6(ip) => buf.extend_from_slice(&ip.octets()),
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Socks5Error;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_read_ipv4() {
        let mut cursor = Cursor::new(vec![192, 168, 1, 1, 0xFF]);
        let addr = TargetAddr::read_from(&mut cursor, AddressType::IPv4)
            .await
            .unwrap();

        assert_eq!(addr, TargetAddr::Ipv4(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(addr.host(), "192.168.1.1");
        // Only the address bytes are consumed
        assert_eq!(cursor.position(), 4);
    }

    #[tokio::test]
    async fn test_read_domain() {
        let mut data = vec![11];
        data.extend_from_slice(b"example.com");
        let mut cursor = Cursor::new(data);

        let addr = TargetAddr::read_from(&mut cursor, AddressType::DomainName)
            .await
            .unwrap();

        assert_eq!(addr, TargetAddr::Domain("example.com".to_string()));
        assert_eq!(addr.authority(443), "example.com:443");
    }

    #[tokio::test]
    async fn test_read_ipv6() {
        let mut octets = [0u8; 16];
        octets[15] = 1;
        let mut cursor = Cursor::new(octets.to_vec());

        let addr = TargetAddr::read_from(&mut cursor, AddressType::IPv6)
            .await
            .unwrap();

        assert_eq!(addr, TargetAddr::Ipv6(Ipv6Addr::LOCALHOST));
        assert_eq!(addr.authority(80), "[::1]:80");
    }

    #[tokio::test]
    async fn test_short_domain_is_io_error() {
        // Declares 10 bytes, carries 3
        let mut cursor = Cursor::new(vec![10, b'a', b'b', b'c']);
        let err = TargetAddr::read_from(&mut cursor, AddressType::DomainName)
            .await
            .unwrap_err();

        assert!(matches!(err, Socks5Error::Io(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_domain_decodes_lossily() {
        let mut cursor = Cursor::new(vec![2, 0xFF, 0xFE, 0x00, 0x50]);
        let addr = TargetAddr::read_from(&mut cursor, AddressType::DomainName)
            .await
            .unwrap();

        assert_eq!(addr, TargetAddr::Domain("\u{FFFD}\u{FFFD}".to_string()));
        // Only the declared domain bytes are consumed
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_write_domain_is_length_prefixed() {
        let mut buf = Vec::new();
        TargetAddr::Domain("a.io".to_string()).write_to(&mut buf);
        assert_eq!(buf, vec![4, b'a', b'.', b'i', b'o']);
    }
}
