use crate::session::Session;
use crate::watch::WatchList;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Default bound on outbound connects; overridable via with_connect_timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Socks5Server represents the SOCKS5 proxy listener and houses related
/// configuration data. The watch list and connect timeout are injected at
/// construction and shared read-only across sessions
pub struct Socks5Server {
    pub listen_addr: String,
    watch: Arc<WatchList>,
    connect_timeout: Duration,
    listener: Option<TcpListener>,
}

/// Socks5Server implementation block
impl Socks5Server {
    /// new is a constructor for the Socks5Server type
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            watch: Arc::new(WatchList::default()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            listener: None,
        }
    }

    /// with_watch_list applies the domains selected for traffic inspection
    pub fn with_watch_list(mut self, watch: WatchList) -> Self {
        self.watch = Arc::new(watch);
        self
    }

    /// with_connect_timeout applies the outbound connect timeout
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// bind to the listen address, panics when called twice
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_some() {
            panic!("bind can only be called once");
        }

        // Instantiate tokio listener
        let listener = TcpListener::bind(&self.listen_addr).await?;
        let addr = listener.local_addr()?;

        info!("SOCKS5 proxy listening on {addr}");

        self.listener = Some(listener);
        Ok(addr)
    }

    /// run handles server spinup and listens for incoming connections,
    /// creating one session per connection
    pub async fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self.listener.take().expect("listener bound above");

        let mut next_id: u64 = 0;

        // Listen for connections to proxy
        loop {
            // Accept incoming connection
            let (inbound, peer_addr) = listener.accept().await?;

            let id = next_id;
            next_id += 1;

            let mut session = Session::new(
                id,
                inbound,
                peer_addr,
                Arc::clone(&self.watch),
                self.connect_timeout,
            );

            // Spawn async task
            tokio::spawn(async move {
                info!(id, "new client: {peer_addr}");

                if let Err(e) = session.run().await {
                    error!(id, "connection error: {e}");
                }
            });
        }
    }
}
