//! Chainseal - tamper-evident audit trail service
//!
//! Binds the ledger to its storage backends and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chainseal::store::{ArchiveStore, FsArchive, HttpIndex, IndexStore, SqliteIndex};
use chainseal::Ledger;
use chainseal_service::{config::Args, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chainseal={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("chainseal service starting");
    info!("Bind: {}", args.bind);

    let index: Arc<dyn IndexStore> = match &args.index_url {
        Some(url) => {
            info!("Authoritative index: {} (prefix {})", url, args.index_prefix);
            let mut index = HttpIndex::new(url, &args.index_prefix)
                .context("failed to construct the remote index client")?;
            if let (Some(user), Some(pass)) = (&args.index_username, &args.index_password) {
                index = index.with_basic_auth(user, pass);
            }
            Arc::new(index)
        }
        None => {
            info!("Authoritative index: sqlite at {}", args.db_path.display());
            let index = SqliteIndex::open(&args.db_path)
                .with_context(|| format!("failed to open {}", args.db_path.display()))?;
            Arc::new(index)
        }
    };

    let archive: Option<Arc<dyn ArchiveStore>> = match &args.archive_dir {
        Some(dir) => {
            info!("Retention archive: {}", dir.display());
            let archive = FsArchive::open(dir)
                .with_context(|| format!("failed to open {}", dir.display()))?;
            Some(Arc::new(archive))
        }
        None => {
            info!("Retention archive: disabled");
            None
        }
    };

    let ledger = Ledger::open(index, archive, args.ledger_config())
        .await
        .context("failed to recover the chain head")?;
    let head = ledger.current_head();
    info!(
        next_sequence = head.next_sequence,
        chain_hash = %head.hash,
        "ledger ready"
    );

    let app = routes::create_router(AppState::new(Arc::new(ledger)));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!("Listening on {}", args.bind);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
