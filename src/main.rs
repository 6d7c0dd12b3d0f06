mod bot;
mod config;
mod data;
mod discord;
mod extensions;
mod signal;

use bot::Bot;
use config::Config;
use extensions::DEFAULT_EXTENSIONS;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn,poise=warn")),
        )
        .init();

    let config = Config::load();
    info!("Loaded configuration: {:?}", config);

    let mut bot = Bot::new(config);
    for name in DEFAULT_EXTENSIONS {
        bot.add_extension(*name);
    }

    bot.start().await
}
