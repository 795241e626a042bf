use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal::api::router;
use portal::config::PortalConfig;
use portal::state::AppState;
use portal::upstream::HttpPortalApi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "portal=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PortalConfig::new_from_env()?;
    let api = HttpPortalApi::new(&config)?;
    info!("forwarding to backend at {}", config.api_base_url);

    let app = router(AppState::new(Arc::new(api)));

    info!("listening on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
