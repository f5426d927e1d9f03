use anyhow::Result;
use tracing::info;

use nong_bot::config::WebhookConfig;
use nong_bot::webhook::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nong_bot=debug".parse()?)
                .add_directive("axum=info".parse()?),
        )
        .init();

    let config = WebhookConfig::load()?;
    let port = config.port;

    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("GitHub webhook server listening on port {port}");
    axum::serve(listener, app).await?;

    Ok(())
}
