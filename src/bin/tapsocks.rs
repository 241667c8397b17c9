use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tapsocks::{Socks5Server, WatchList};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "A SOCKS5 forward proxy with selective traffic inspection", long_about = None)]
struct Args {
    /// Listening port
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Watched destination domain (substring match, repeatable)
    #[arg(short, long = "watch")]
    watch: Vec<String>,

    /// Outbound connect timeout in seconds
    #[arg(short = 't', long, default_value_t = 10)]
    connect_timeout: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Initialize tracing subscriber
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let watch = WatchList::new(args.watch);
    if !watch.is_empty() {
        info!("Traffic inspection enabled");
    }

    // Instantiate server
    let mut server = Socks5Server::new(format!("0.0.0.0:{}", args.port))
        .with_watch_list(watch)
        .with_connect_timeout(Duration::from_secs(args.connect_timeout));

    // Run it
    info!("Starting SOCKS5 proxy on port {}", args.port);
    server.run().await
}
