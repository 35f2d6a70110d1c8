use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinematch::{
    api::{create_router, AppState},
    config::Config,
    data::CsvDatasetSource,
    services::HybridRecommender,
};

const DEFAULT_LOG_FILTER: &str = "cinematch=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let source = CsvDatasetSource::new(&config.movies_path, &config.ratings_path);
    let mut recommender = HybridRecommender::new(config.alpha, config.max_features)?;
    recommender
        .fit(&source)
        .context("Failed to fit recommender")?;

    let app = create_router(AppState::new(recommender));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
