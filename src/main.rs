use std::sync::Arc;

use trader_explorer::api::router::create_router;
use trader_explorer::config::AppConfig;
use trader_explorer::explorer::PgFilterStateStore;
use trader_explorer::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database connected");

    let metrics_handle = metrics::init_metrics();

    tracing::info!(
        debounce_ms = config.count_debounce_ms,
        default_limit = config.default_page_limit,
        max_limit = config.max_page_limit,
        "Explorer configured"
    );

    let state = AppState {
        filter_store: Arc::new(PgFilterStateStore::new(pool.clone())),
        db: pool,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
