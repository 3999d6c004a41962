//! KYC Credential Broker
//!
//! HTTP service turning scanned identity documents into accounts.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kyc_broker::{
    routes, sweeper, AppState, Config, InMemoryAccountStore, InMemorySessionStore, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kyc_broker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(port = config.port, database = ?config.database, "Loaded configuration");

    let addr = format!("0.0.0.0:{}", config.port);

    match config.database.clone() {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(&path).map_err(|e| anyhow::anyhow!("{e}"))?);
            let state = Arc::new(AppState::new(config, Arc::clone(&store), Arc::clone(&store)));
            serve(&addr, state, store.clone(), store).await
        }
        None => {
            tracing::warn!("No database configured, sessions and accounts are in-memory only");
            let sessions = Arc::new(InMemorySessionStore::new());
            let accounts = Arc::new(InMemoryAccountStore::new());
            let state = Arc::new(AppState::new(
                config,
                Arc::clone(&sessions),
                Arc::clone(&accounts),
            ));
            serve(&addr, state, sessions, accounts).await
        }
    }
}

async fn serve<S, A>(
    addr: &str,
    state: Arc<AppState<S, A>>,
    session_store: Arc<S>,
    account_store: Arc<A>,
) -> Result<()>
where
    S: kyc_broker::SessionStore + 'static,
    A: kyc_broker::AccountStore + kyc_broker::AuditStore + 'static,
{
    let sweep_interval = state.config.sweep_interval_secs;
    let retention = state.config.audit_retention_days;
    tokio::spawn(sweeper::run(
        session_store,
        account_store,
        sweep_interval,
        retention,
    ));

    let app = routes::create_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Broker listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
