use anyhow::Context;
use canopy::api::create_router;
use canopy::config::Config;
use canopy::imagery::EarthEngineClient;
use canopy::services::AnalysisService;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canopy=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting canopy with config: {:?}", config);

    // Decided once; a failure here keeps this process in mock mode until restart.
    let platform = match EarthEngineClient::connect(&config.imagery).await {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::warn!("Imagery platform initialization failed: {:#}", err);
            None
        }
    };

    let analysis_service = AnalysisService::new(platform, config.imagery.cloud_cover_threshold);
    if analysis_service.is_degraded() {
        tracing::warn!("NDVI analysis will return mock data until auth is configured");
    }

    // Create router
    let app = create_router(analysis_service);
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let addr = addr
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid listen address {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
