use std::sync::Arc;

use curio_api::app::{build_app, AppServices};
use curio_api::config::ApiConfig;
use curio_engine::{HoldSweeper, InMemoryStore, PostgresStore, Store};
use curio_reservations::BanPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    curio_observability::init();

    let config = ApiConfig::from_env();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using volatile in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let services = Arc::new(AppServices::new(
        store,
        BanPolicy::default(),
        config.hold_ttl,
    ));

    let sweeper = HoldSweeper::spawn(services.reservations.clone(), config.sweep_interval);

    let app = build_app(services);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    sweeper.shutdown().await;
    Ok(())
}
