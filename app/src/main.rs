use axum::Router;
use categories::service::CategoryService;
use clap::Parser;
use common::{AppState, Config};
use database::Database;
use engine::{DerivedStateGraph, EngineConfig, LocalClock};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transactions::store::LedgerStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from CLI args
    let config = Config::parse();

    // 3. Initialize Database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    if config.seed_categories {
        let seeded = CategoryService::seed_defaults(&db).await?;
        if seeded > 0 {
            tracing::info!("Seeded {} default categories", seeded);
        }
    }

    // 4. Snapshots and derived state
    let store = LedgerStore::open(db.clone()).await?;
    let engine = DerivedStateGraph::spawn(
        &store,
        Arc::new(LocalClock),
        EngineConfig {
            week_start: config.week_start,
            offload_threshold: config.offload_threshold,
        },
    );

    let state = Arc::new(AppState { db });

    // 5. Routing
    let app = Router::<Arc<AppState>>::new()
        .nest("/transactions", transactions::handler::transactions_router(state.clone()))
        .nest("/categories", categories::handler::categories_router(state.clone()))
        .merge(engine::handler::engine_router::<Arc<AppState>>(engine.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // 6. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("Shutting down");
    engine.shutdown()?;
    drop(store);

    Ok(())
}
