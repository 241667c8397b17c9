use crate::tap::{Direction, TrafficTap};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Relay read buffer size. Chunk boundaries seen here are the chunk
/// boundaries the taps observe
const RELAY_BUF_SIZE: usize = 8 * 1024;

/// RelayPair forwards bytes verbatim between the client and target
/// endpoints once negotiation is complete. Each direction runs
/// independently; order is preserved within a direction only
pub struct RelayPair<C, T> {
    client: C,
    target: T,
    taps: Option<(TrafficTap, TrafficTap)>,
}

/// RelayPair implementation block
impl<C, T> RelayPair<C, T>
where
    C: AsyncRead + AsyncWrite + Unpin,
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// new is a constructor for the RelayPair type
    pub fn new(client: C, target: T) -> Self {
        Self {
            client,
            target,
            taps: None,
        }
    }

    /// with_tap attaches per-direction traffic taps for a watched domain
    pub fn with_tap(mut self, domain: Option<&str>) -> Self {
        self.taps = domain.map(|d| {
            let domain: Arc<str> = Arc::from(d);
            (
                TrafficTap::new(Arc::clone(&domain), Direction::ClientToTarget),
                TrafficTap::new(domain, Direction::TargetToClient),
            )
        });
        self
    }

    /// run relays until both directions have terminated and returns the
    /// byte counts forwarded (client -> target, target -> client)
    pub async fn run(self) -> (u64, u64) {
        let (client_rd, client_wr) = tokio::io::split(self.client);
        let (target_rd, target_wr) = tokio::io::split(self.target);

        let (c2t_tap, t2c_tap) = match self.taps {
            Some((c2t, t2c)) => (Some(c2t), Some(t2c)),
            None => (None, None),
        };

        tokio::join!(
            relay_direction(client_rd, target_wr, Direction::ClientToTarget, c2t_tap),
            relay_direction(target_rd, client_wr, Direction::TargetToClient, t2c_tap),
        )
    }
}

/// relay_direction forwards one leg chunk-by-chunk in arrival order. On EOF
/// or fault the peer's write side is flushed and shut down, so its send
/// buffer drains before the close propagates. That is the sole termination
/// mechanism; the opposite leg keeps running until its own EOF
async fn relay_direction<R, W>(
    mut reader: R,
    mut writer: W,
    direction: Direction,
    tap: Option<TrafficTap>,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; RELAY_BUF_SIZE];
    let mut forwarded: u64 = 0;

    // Readiness probe: an empty flush to the newly active endpoint
    if let Err(e) = writer.flush().await {
        warn!(%direction, "relay fault: {e}");
        let _ = writer.shutdown().await;
        return forwarded;
    }

    loop {
        match reader.read(&mut buf).await {
            // EOF: propagate the half-close below
            Ok(0) => break,
            Ok(n) => {
                let chunk = &buf[..n];

                // Inspection never consumes or reorders the chunk
                if let Some(tap) = &tap {
                    tap.observe(chunk);
                }

                if let Err(e) = writer.write_all(chunk).await {
                    warn!(%direction, "relay fault: {e}");
                    break;
                }
                forwarded += n as u64;
            }
            Err(e) => {
                warn!(%direction, "relay fault: {e}");
                break;
            }
        }
    }

    // Drain then close the peer's write side
    let _ = writer.flush().await;
    let _ = writer.shutdown().await;

    forwarded
}
