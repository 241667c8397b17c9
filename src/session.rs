use crate::auth::negotiate_method;
use crate::commands::{dial, read_command_request, reply_code_for, send_reply};
use crate::protocol::{Command, ReplyCode};
use crate::relay::RelayPair;
use crate::watch::WatchList;
use anyhow::{Result, bail};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Stage is the session's current phase, gating which component may act on
/// incoming data. Transitions are strictly forward; no stage is revisited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Handshaking,
    Negotiating,
    Relaying,
    Closed,
}

/// Session is the aggregate root for one client connection: it owns the
/// client endpoint, binds the target endpoint once the dial succeeds, and
/// drives handshake, command processing, and the relay. All session state is
/// mutated by the one task handling the connection
pub struct Session {
    id: u64,
    peer: SocketAddr,
    stage: Stage,
    client: TcpStream,
    watch: Arc<WatchList>,
    connect_timeout: Duration,
}

/// Session implementation block
impl Session {
    /// new is a constructor for the Session type
    pub fn new(
        id: u64,
        client: TcpStream,
        peer: SocketAddr,
        watch: Arc<WatchList>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            id,
            peer,
            stage: Stage::Handshaking,
            client,
            watch,
            connect_timeout,
        }
    }

    /// stage returns the session's current phase
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// advance moves the session forward; stages never revisit
    fn advance(&mut self, next: Stage) {
        assert!(next > self.stage, "session stage may only move forward");
        self.stage = next;
        debug!(id = self.id, stage = ?self.stage, "stage transition");
    }

    /// run drives the full protocol flow for this connection, panics when
    /// called twice. Every exit -> handshake failure, command failure, dial
    /// failure, or relay termination -> passes through here and lands the
    /// session in the Closed stage
    pub async fn run(&mut self) -> Result<()> {
        let result = self.drive().await;
        self.advance(Stage::Closed);
        result
    }

    /// drive performs the protocol flow itself. Every failure is terminal:
    /// the client endpoint closes when the session drops
    async fn drive(&mut self) -> Result<()> {
        // Handshaking: greeting exchange and method selection
        negotiate_method(&mut self.client).await?;
        self.advance(Stage::Negotiating);

        // Negotiating: one command request per session
        let req = read_command_request(&mut self.client).await?;

        // Only CONNECT is handled; anything else closes the client
        // endpoint with no reply
        if req.command != Command::Connect {
            bail!("[ERR] unsupported command: {:?}", req.command);
        }

        let dest = req.dest;
        info!(id = self.id, peer = %self.peer, "client requests connect to {dest}");

        // Watched status is determined once, at command time, and fixed
        // for the session's lifetime
        let host = dest.host();
        let watched_domain = self.watch.matches(&host).then_some(host);

        let target = match dial(&dest, self.connect_timeout).await {
            Ok(target) => target,
            Err(e) => {
                let code = reply_code_for(&e);
                send_reply(&mut self.client, code, dest.address.addr_type(), None, 0).await?;
                bail!("[ERR] connect to {dest} failed: {e}");
            }
        };

        // Echo the requested address back as the bound address; this proxy
        // does not allocate a distinct one
        send_reply(
            &mut self.client,
            ReplyCode::Succeeded,
            dest.address.addr_type(),
            Some(&dest.address),
            dest.port,
        )
        .await?;
        self.advance(Stage::Relaying);

        if let Some(domain) = &watched_domain {
            info!(id = self.id, "watched destination {domain}: tapping traffic");
        }

        // Relaying: opaque byte forwarding from here on, no further
        // protocol parsing on either endpoint
        let (from_client, from_target) = RelayPair::new(&mut self.client, target)
            .with_tap(watched_domain.as_deref())
            .run()
            .await;

        info!(
            id = self.id,
            "connection closed: {from_client} bytes from client, {from_target} bytes from target"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn stages_are_strictly_ordered() {
        assert!(Stage::Handshaking < Stage::Negotiating);
        assert!(Stage::Negotiating < Stage::Relaying);
        assert!(Stage::Relaying < Stage::Closed);
    }

    /// Loopback socket pair: the client side and a session wrapping the
    /// accepted side.
    async fn socket_pair() -> (TcpStream, Session) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (accepted, peer) = listener.accept().await.unwrap();

        let session = Session::new(
            0,
            accepted,
            peer,
            Arc::new(WatchList::default()),
            Duration::from_secs(1),
        );
        (client, session)
    }

    #[tokio::test]
    async fn failed_handshake_ends_closed() {
        let (mut client, mut session) = socket_pair().await;

        // Offer only username/password; the handshake fails
        client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();

        assert!(session.run().await.is_err());
        assert_eq!(session.stage(), Stage::Closed);
    }

    #[tokio::test]
    async fn unsupported_command_ends_closed() {
        let (mut client, mut session) = socket_pair().await;

        // Pipelined greeting and BIND request
        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        client
            .write_all(&[0x05, 0x02, 0x00, 0x01, 127, 0, 0, 1, 0x00, 0x50])
            .await
            .unwrap();

        assert!(session.run().await.is_err());
        assert_eq!(session.stage(), Stage::Closed);
    }

    #[tokio::test]
    async fn dial_failure_ends_closed() {
        // Grab a port with no listener behind it
        let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = unused.local_addr().unwrap().port();
        drop(unused);

        let (mut client, mut session) = socket_pair().await;

        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        let mut req = vec![0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1];
        req.extend_from_slice(&dead_port.to_be_bytes());
        client.write_all(&req).await.unwrap();

        assert!(session.run().await.is_err());
        assert_eq!(session.stage(), Stage::Closed);
    }

    #[tokio::test]
    async fn completed_session_ends_closed() {
        // Target accepts and drops the connection right away, so the relay
        // terminates through the half-close path
        let target = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target_port = target.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = target.accept().await;
        });

        let (mut client, mut session) = socket_pair().await;

        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        let mut req = vec![0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1];
        req.extend_from_slice(&target_port.to_be_bytes());
        client.write_all(&req).await.unwrap();
        client.shutdown().await.unwrap();

        session.run().await.unwrap();
        assert_eq!(session.stage(), Stage::Closed);
    }
}
