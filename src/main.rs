//! Tribunal - community verdict ledger

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tribunal::{
    clock::SystemClock,
    config::{Args, LogFormat, StoreKind},
    db::{LedgerStore, MemoryStore, MongoClient, MongoStore},
    server, AppState, Tribunal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("tribunal={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let policy = args.day_policy();

    info!("======================================");
    info!("  Tribunal - community verdict ledger");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Store: {:?}", args.store);
    info!("Day boundary: UTC{}", policy.offset());
    info!("======================================");

    let store = open_store(&args).await;
    let tribunal = Tribunal::new(store, Arc::new(SystemClock), policy);
    let state = Arc::new(AppState::new(args, tribunal));

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Open the configured store. In dev mode an unreachable MongoDB falls back to memory.
async fn open_store(args: &Args) -> Arc<dyn LedgerStore> {
    if args.store == StoreKind::Memory {
        warn!("Using in-memory store; all data is lost on exit");
        return Arc::new(MemoryStore::new());
    }

    let connected = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => MongoStore::connect(client, args.txn_retries).await,
        Err(e) => Err(e),
    };

    match connected {
        Ok(store) => {
            info!("MongoDB connected successfully");
            Arc::new(store)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Arc::new(MemoryStore::new())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
