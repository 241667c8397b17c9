use crate::protocol::{AuthMethod, Version};
use anyhow::{Result, bail};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// negotiate_method handles negotiation-method selection between the SOCKS
/// server and client. Only the no-credentials method is acceptable; if the
/// client does not offer it the connection is closed without a response
pub async fn negotiate_method<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // ClientHello format
    // +----+----------+----------+
    // |VER | NMETHODS | METHODS  |
    // +----+----------+----------+
    // | 1  |    1     | 1 to 255 |
    // +----+----------+----------+

    // Instantiate handshake buffer & read
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await?;

    // Parse version and client methods from handshake
    let version = buf[0];
    let n_methods = buf[1];

    // Ensure version is 0x05 -> SOCKS5
    if version != Version::SOCKS5 as u8 {
        bail!("[ERR] not SOCKS5");
    }

    // Greetings must offer at least one method
    if n_methods == 0 {
        bail!("[ERR] empty negotiation method list");
    }

    // Read offered methods
    let mut methods = vec![0u8; n_methods as usize];
    stream.read_exact(&mut methods).await?;

    // Retrieve desired method; no fallback negotiation is implemented,
    // so an unacceptable offer closes the connection with no response
    let Some(method) = select_method(&methods) else {
        bail!("[ERR] no acceptable negotiation method offered");
    };

    // ServerChoice method selection reply format
    // +----+--------+
    // |VER | METHOD |
    // +----+--------+
    // | 1  |   1    |
    // +----+--------+

    // Write response to client
    stream
        .write_all(&[Version::SOCKS5 as u8, method as u8])
        .await?;

    Ok(())
}

/// select_method takes the methods offered by the socks client
/// and returns the selected one, if any is acceptable
fn select_method(client_methods: &[u8]) -> Option<AuthMethod> {
    // Preferred method order -> only no-auth is supported
    const PREFERRED_METHODS: &[AuthMethod] = &[AuthMethod::NoAuth];

    PREFERRED_METHODS
        .iter()
        .copied()
        .find(|&preferred| client_methods.contains(&(preferred as u8)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selects_no_auth_when_offered() {
        let (mut client, mut server) = tokio::io::duplex(64);

        // Offer user/pass and no-auth
        client.write_all(&[0x05, 0x02, 0x02, 0x00]).await.unwrap();
        negotiate_method(&mut server).await.unwrap();

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x00]);
    }

    #[tokio::test]
    async fn closes_without_reply_when_no_auth_missing() {
        let (mut client, mut server) = tokio::io::duplex(64);

        // Offer only user/pass
        client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();
        assert!(negotiate_method(&mut server).await.is_err());

        // Server side dropped without writing a selection
        drop(server);
        let mut buf = [0u8; 2];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_wrong_version() {
        let (mut client, mut server) = tokio::io::duplex(64);

        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();
        assert!(negotiate_method(&mut server).await.is_err());
    }

    #[tokio::test]
    async fn rejects_empty_method_list() {
        let (mut client, mut server) = tokio::io::duplex(64);

        client.write_all(&[0x05, 0x00]).await.unwrap();
        assert!(negotiate_method(&mut server).await.is_err());
    }
}
