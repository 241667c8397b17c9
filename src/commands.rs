use crate::address::{Address, DestAddr, read_dest_addr};
use crate::protocol::{AddressType, Command, RSV, ReplyCode, Version};
use anyhow::{Result, anyhow, bail};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// CommandRequest represents a parsed client connection request.
/// Immutable once parsed
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub command: Command,
    pub dest: DestAddr,
}

/// read_command_request parses a SOCKS5 command request from the client
pub async fn read_command_request<S>(stream: &mut S) -> Result<CommandRequest>
where
    S: AsyncRead + Unpin,
{
    // SOCKS5 request format
    // +----+-----+-------+------+----------+----------+
    // |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+

    // Instantiate a request buffer & read
    let mut reqbuf = [0u8; 3];
    stream.read_exact(&mut reqbuf).await?;

    // Parse
    let version = reqbuf[0];
    let command = reqbuf[1];
    // Not retrieving RSV (RESERVED) -> 0x00

    // Ensure version is 0x05 -> SOCKS5
    if version != Version::SOCKS5 as u8 {
        bail!("[ERR] not SOCKS5");
    }

    let command =
        Command::from_byte(command).ok_or_else(|| anyhow!("[ERR] unknown command: {command:#04x}"))?;

    // Parse destination address and port
    let dest = read_dest_addr(stream).await?;

    Ok(CommandRequest { command, dest })
}

/// dial opens the outbound connection to the requested destination,
/// bounded by a connect timeout
pub async fn dial(dest: &DestAddr, connect_timeout: Duration) -> io::Result<TcpStream> {
    match tokio::time::timeout(connect_timeout, TcpStream::connect(dest.to_string())).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect to {dest} timed out"),
        )),
    }
}

/// reply_code_for maps an outbound connect error to a SOCKS5 reply code
pub fn reply_code_for(e: &io::Error) -> ReplyCode {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
        io::ErrorKind::HostUnreachable => ReplyCode::HostUnreachable,
        io::ErrorKind::NetworkUnreachable => ReplyCode::NetworkUnreachable,
        io::ErrorKind::TimedOut => ReplyCode::TtlExpired,
        _ => ReplyCode::ServerFailure,
    }
}

/// encode_reply builds a SOCKS5 reply. On success the originally requested
/// address is echoed as the bound address; on failure `addr` is None and the
/// reply carries the requested address type with a zero/empty placeholder
pub fn encode_reply(
    reply_code: ReplyCode,
    addr_type: AddressType,
    addr: Option<&Address>,
    port: u16,
) -> Vec<u8> {
    // SOCKS5 reply format
    // +----+-----+-------+------+----------+----------+
    // |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+

    let mut reply = vec![
        Version::SOCKS5 as u8,
        reply_code as u8,
        RSV,
        addr_type as u8,
    ];

    match addr {
        Some(Address::IPv4(ip)) => reply.extend_from_slice(&ip.octets()),
        Some(Address::IPv6(ip)) => reply.extend_from_slice(&ip.octets()),
        Some(Address::DomainName(domain)) => {
            reply.push(domain.len() as u8);
            reply.extend_from_slice(domain.as_bytes());
        }
        // Placeholder bound address for failure replies
        None => match addr_type {
            AddressType::IPv4 => reply.extend_from_slice(&[0u8; 4]),
            AddressType::IPv6 => reply.extend_from_slice(&[0u8; 16]),
            AddressType::DomainName => reply.push(0),
        },
    }

    reply.extend_from_slice(&port.to_be_bytes());
    reply
}

/// send_reply writes a SOCKS5 reply to the client
pub async fn send_reply<S>(
    stream: &mut S,
    reply_code: ReplyCode,
    addr_type: AddressType,
    addr: Option<&Address>,
    port: u16,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let reply = encode_reply(reply_code, addr_type, addr, port);
    stream.write_all(&reply).await?;
    Ok(())
}
