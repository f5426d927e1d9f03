use anyhow::Result;
use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use songbird::SerenityInit;
use tracing::{error, info};

use nong_bot::bot::CommunityBot;
use nong_bot::config::BotConfig;
use nong_bot::sources::YtDlpResolver;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nong_bot=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    info!("starting nong-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = BotConfig::load()?;

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES;

    let handler = CommunityBot::new(config.clone());

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird()
        .await?;

    // Graceful shutdown
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        info!("shutdown signal received, exiting");
        std::process::exit(0);
    });

    if let Err(why) = client.start().await {
        error!("Client error: {why:?}");
    }

    Ok(())
}

/// `--health-check`: verifies the external tools playback depends on.
async fn health_check() -> Result<()> {
    YtDlpResolver::verify_dependencies().await?;
    println!("OK");
    Ok(())
}
