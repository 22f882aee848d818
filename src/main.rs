//! pathdoc server.
//!
//! Configuration comes from the environment (see [`pathdoc::config`]);
//! command-line flags override it.

use std::process::ExitCode;

use clap::Parser;
use pathdoc::{store, Config, Dispatcher, Repository, Server};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pathdoc", version, about = "Stores one JSON document per request path.")]
struct Cli {
    /// HTTP bind host (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// HTTP bind port (overrides SERVER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Document store URI, `memory://` for the in-process store (overrides DB_URI)
    #[arg(long)]
    db_uri: Option<String>,

    /// Database name (overrides DB_NAME)
    #[arg(long)]
    db_name: Option<String>,

    /// Collection name (overrides DB_COLLECTION)
    #[arg(long)]
    db_collection: Option<String>,

    /// Per-operation store timeout in milliseconds (overrides DB_TIMEOUT_MS)
    #[arg(long)]
    db_timeout_ms: Option<u64>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(uri) = self.db_uri {
            config.store.uri = uri;
        }
        if let Some(name) = self.db_name {
            config.store.database = name;
        }
        if let Some(collection) = self.db_collection {
            config.store.collection = collection;
        }
        if let Some(ms) = self.db_timeout_ms {
            config.store.timeout = std::time::Duration::from_millis(ms);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> pathdoc::Result<()> {
    let mut config = Config::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    if !config.store.uri_has_credentials() {
        warn!(
            username = %config.store.username,
            "DB_USERNAME/DB_PASSWORD are not used to connect; put credentials in DB_URI"
        );
    }

    let store = store::connect(&config.store).await?;
    store::verify(store.as_ref(), store::PING_TIMEOUT).await?;

    let addr = config.server.socket_addr()?;
    info!(%addr, "starting pathdoc v{}", env!("CARGO_PKG_VERSION"));
    info!(
        store = %store.describe(),
        database = %config.store.database,
        collection = %config.store.collection,
        "document store ready"
    );

    let repo = Repository::new(store.clone(), config.store.timeout);
    let served = Server::bind(addr).serve(Dispatcher::new(repo).into_handler()).await;

    if let Err(e) = store.shutdown().await {
        warn!("store shutdown failed: {e}");
    }
    info!("shutdown complete");
    served
}
