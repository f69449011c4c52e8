use anyhow::Context;
use clubledger::api::{self, AppState};
use clubledger::{init_store, Config, SqliteStore};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let port = config.port;

    let pool = init_store(&config.database_path)
        .await
        .context("initializing document store")?;
    let store = Arc::new(SqliteStore::new(pool).with_max_batch_ops(config.max_batch_ops));

    let app = api::create_router(AppState::new(store));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
