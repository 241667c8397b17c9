use crate::protocol::AddressType;
use anyhow::{Result, anyhow, bail};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Address represents a network address or domain to be used as the
/// SOCKS5 target address
#[derive(Debug, Clone, PartialEq)]
pub enum Address {
    IPv4(Ipv4Addr),
    DomainName(String),
    IPv6(Ipv6Addr),
}

/// Address implementation block
impl Address {
    /// addr_type returns the SOCKS5 address type byte for this address
    pub fn addr_type(&self) -> AddressType {
        match self {
            Address::IPv4(_) => AddressType::IPv4,
            Address::DomainName(_) => AddressType::DomainName,
            Address::IPv6(_) => AddressType::IPv6,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::IPv4(ip) => write!(f, "{ip}"),
            Address::DomainName(domain) => write!(f, "{domain}"),
            Address::IPv6(ip) => write!(f, "{ip}"),
        }
    }
}

/// DestAddr represents a requested forward proxy destination:
/// address plus port
#[derive(Debug, Clone, PartialEq)]
pub struct DestAddr {
    pub address: Address,
    pub port: u16,
}

/// DestAddr implementation block
impl DestAddr {
    /// host returns the destination host as a string, without the port.
    /// Used for watch-list matching
    pub fn host(&self) -> String {
        self.address.to_string()
    }
}

impl fmt::Display for DestAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 literals must be bracketed to form a dialable host:port
        match &self.address {
            Address::IPv6(ip) => write!(f, "[{ip}]:{}", self.port),
            addr => write!(f, "{addr}:{}", self.port),
        }
    }
}

/// read_dest_addr contains logic to parse the network address
/// from an incoming client connection request: IPv4, IPv6, or domain name
/// and returns the resultant DestAddr
pub async fn read_dest_addr<S>(stream: &mut S) -> Result<DestAddr>
where
    S: AsyncRead + Unpin,
{
    // Read address type byte from stream
    let mut atype = [0u8; 1];
    stream.read_exact(&mut atype).await?;

    let addr_type =
        AddressType::from_byte(atype[0]).ok_or_else(|| anyhow!("[ERR] unknown address type"))?;

    // Match type and extract address or domain name
    let address = match addr_type {
        AddressType::IPv4 => {
            let mut addr = [0u8; 4];
            stream.read_exact(&mut addr).await?;
            Address::IPv4(Ipv4Addr::from(addr))
        }
        AddressType::DomainName => {
            // First octet in DomainName contains the number of
            // octets to follow
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;

            if len[0] == 0 {
                bail!("[ERR] domain length cannot be 0");
            }

            // Read domain and convert to string
            let mut domain = vec![0u8; len[0] as usize];
            stream.read_exact(&mut domain).await?;
            Address::DomainName(String::from_utf8(domain)?)
        }
        AddressType::IPv6 => {
            let mut addr = [0u8; 16];
            stream.read_exact(&mut addr).await?;
            Address::IPv6(Ipv6Addr::from(addr))
        }
    };

    // Read port -> BigEndian (network order)
    let mut port_buf = [0u8; 2];
    stream.read_exact(&mut port_buf).await?;
    let port = u16::from_be_bytes(port_buf);

    Ok(DestAddr { address, port })
}
