use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinematch_api::{
    catalog::PostgresCatalogLoader,
    config::Config,
    db,
    routes::{create_router, AppState},
    services::{fallback::FallbackLimits, providers::tmdb::TmdbProvider, RecommendationEngine},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let loader = Arc::new(PostgresCatalogLoader::new(pool));

    let provider = Arc::new(
        TmdbProvider::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
            config.tmdb_region.clone(),
            Duration::from_secs(config.provider_timeout_secs),
        )
        .context("Failed to build TMDB client")?,
    );

    let engine = Arc::new(RecommendationEngine::new(
        loader,
        provider,
        FallbackLimits {
            similar_pages: config.similar_pages,
        },
    ));

    // Serve even if the first build fails; a refresh can be retried over HTTP.
    match engine.refresh().await {
        Ok(indexed) => tracing::info!(indexed, "Initial index build complete"),
        Err(error) => {
            tracing::warn!(error = %error, "Initial index build failed; serving without a local index")
        }
    }

    let state = AppState { engine };
    let app = create_router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind listener")?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
