use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude::GatewayIntents;
use tracing::{error, info};

use crate::{
    config::Config,
    discord::{RULE, framework::DiscordClient},
    extensions::{self, ExtensionLoader, LoadReport},
    signal,
};

/// Owns the configuration and the extensions to load. Everything here is
/// settled before `start` hands control to the framework.
pub struct Bot {
    config: Config,
    initial_extensions: Vec<String>,
}

impl Bot {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            initial_extensions: Vec::new(),
        }
    }

    pub fn add_extension(&mut self, name: impl Into<String>) -> &mut Self {
        self.initial_extensions.push(name.into());
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.initial_extensions
    }

    pub fn intents() -> GatewayIntents {
        GatewayIntents::non_privileged()
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::GUILDS
    }

    pub fn load_extensions(&self) -> LoadReport {
        ExtensionLoader::new(extensions::catalogue()).load_all(self.extensions())
    }

    /// Loads extensions, connects and runs until the gateway gives up or a
    /// termination signal arrives. Command sync happens in the framework's
    /// setup hook once the first `Ready` comes in.
    pub async fn start(self) -> anyhow::Result<()> {
        let token = self.config.require_token()?.to_owned();

        info!("{}", RULE);
        info!("Starting Plutus ({} mode)...", self.config.mode);
        info!("{}", RULE);

        let report = self.load_extensions();
        let mut client =
            DiscordClient::new(&token, Self::intents(), Arc::new(self.config), report)
                .await
                .context("Failed to build the Discord client")?;
        let shard_manager = client.serenity_client.shard_manager.clone();

        tokio::select! {
            Err(why) = client.serenity_client.start() => {
                error!("Client error: {:?}", why);
            },
            _ = signal::wait_for_signal() => {
                info!("Shutting down");
                shard_manager.shutdown_all().await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    fn bot() -> Bot {
        Bot::new(Config::from_lookup(Mode::Dev, |_| None))
    }

    #[test]
    fn extensions_keep_insertion_order() {
        let mut bot = bot();
        bot.add_extension("cogs.general").add_extension("cogs.music");
        assert_eq!(bot.extensions(), ["cogs.general", "cogs.music"]);
    }

    #[test]
    fn bad_extension_does_not_block_valid_ones() {
        let mut bot = bot();
        bot.add_extension("cogs.missing").add_extension("cogs.general");

        let report = bot.load_extensions();

        assert_eq!(report.loaded, vec!["cogs.general"]);
        assert_eq!(report.failures().count(), 1);
        assert!(report.commands.iter().any(|c| c.name == "health"));
    }

    #[test]
    fn intents_include_message_content() {
        let intents = Bot::intents();
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(GatewayIntents::GUILD_VOICE_STATES));
        assert!(intents.contains(GatewayIntents::GUILDS));
    }

    #[tokio::test]
    async fn start_without_token_fails_fast() {
        let error = bot().start().await.unwrap_err();
        assert!(error.to_string().contains("DISCORD_TOKEN"));
    }
}
