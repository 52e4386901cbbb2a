// catalog server - social cataloging backend

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::{api, app_state::AppState, config::Config, data_seeder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let app_state = if std::env::var("CATALOG_DEV").is_ok() {
        // Dev mode: in-memory store with sample data.
        let state = AppState::in_memory(config.clone());
        data_seeder::seed(&*state.store).await?;
        state
    } else {
        AppState::new(config.clone()).await?
    };

    let app = api::router(app_state);

    let addr = config.server_address();
    info!("catalog server listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
