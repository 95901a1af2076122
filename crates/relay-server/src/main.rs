//! WebSocket relay hub.

use clap::Parser;
use relay_server::config::Config;
use relay_server::server;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "relay-server")]
#[clap(about = "Real-time relay hub for presence, chat, signaling and AI replies")]
struct Cli {
    /// Interface to bind (overrides RELAY_BIND_ADDR)
    #[clap(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides RELAY_PORT)
    #[clap(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("relay_server=info,tower_http=info")),
        )
        .init();

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        "Starting relay-server on {} (max_clients = {}, model = {})",
        config.socket_addr_string(),
        config.max_clients,
        config.ai.model
    );

    server::run(config).await
}
