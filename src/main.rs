//! Crypto Price Agent server binary.

use crypto_price_agent::{api, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the real environment.
    let dotenv_path = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crypto_price_agent=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv_path {
        Some(path) => tracing::info!("Loaded environment from {}", path.display()),
        None => tracing::debug!("No .env file found"),
    }

    let config = Config::from_env()?;
    tracing::info!("Starting crypto price agent (model={})", config.model);

    api::serve(config).await
}
