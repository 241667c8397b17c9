//! A SOCKS5 forward proxy with selective traffic inspection
//!
//! ## SOCKS5 Implementation
//!
//! - Features:
//!     - CONNECT
//!     - No Authentication
//!     - Async using tokio, one task per session
//!     - Watch-list driven traffic taps: payloads to and from watched
//!       domains are classified (text vs binary) and logged in both
//!       directions without altering the relayed bytes
//!     - Half-close propagation between the client and target endpoints
//! - [SOCKS5 (RFC 1928)](https://datatracker.ietf.org/doc/html/rfc1928)
//!
//! # Example
//! ```no_run
//! use tapsocks::{Socks5Server, WatchList};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Socks5Server::new("127.0.0.1:8000")
//!         .with_watch_list(WatchList::new(vec!["example.com".into()]));
//!     server.run().await
//! }
//! ```

pub mod address;
pub mod auth;
pub mod commands;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod session;
pub mod tap;
pub mod watch;

// Re-export main types at crate root for convenience
pub use protocol::{AddressType, AuthMethod, Command, ReplyCode, Version};
pub use relay::RelayPair;
pub use server::Socks5Server;
pub use session::{Session, Stage};
pub use tap::{Classification, Direction, TrafficEvent, TrafficTap};
pub use watch::WatchList;
