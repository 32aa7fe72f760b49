use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use visao_server::{
    intake::client::ClientManager, network::Server, AppError, Configuration, FramePipeline,
};

#[derive(Parser)]
#[command(name = "visao-server", version)]
#[command(about = "Real-time object and route-code recognition for streaming clients")]
struct Args {
    /// TOML configuration file; `visao.toml` is used when present
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listening address (overrides the configuration)
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port (overrides the configuration)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let mut configuration = Configuration::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        configuration.server.host = host;
    }
    if let Some(port) = args.port {
        configuration.server.port = port;
    }
    init_logging(&configuration.log_level);
    info!("Starting visao-server v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = FramePipeline::builder(configuration.clone()).build()?;
    let (client_manager, clients) = ClientManager::new();
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        let clients = clients.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for the shutdown signal: {}", e);
                return;
            }
            info!("Shutdown requested");
            match clients.disconnect_all().await {
                Ok(count) => info!("Disconnected {} clients", count),
                Err(e) => warn!("Could not disconnect clients: {}", e),
            }
            shutdown.cancel();
        }
    });

    let result = Server::new(&configuration, pipeline, clients)
        .start(shutdown)
        .await;
    client_manager.stop();
    result
}
