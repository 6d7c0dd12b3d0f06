use poise::serenity_prelude as serenity;
use serenity::{ActivityData, OnlineStatus, Ready, UserId};
use tracing::info;

use super::RULE;
use crate::config::Config;

/// What gets logged once the gateway handshake completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub user_name: String,
    pub user_id: UserId,
    pub guild_count: usize,
    pub mode_line: String,
}

impl SessionSummary {
    pub fn from_ready(ready: &Ready, config: &Config) -> Self {
        Self {
            user_name: ready.user.name.clone(),
            user_id: ready.user.id,
            guild_count: ready.guilds.len(),
            mode_line: mode_line(config),
        }
    }

    pub fn log(&self) {
        info!("{}", RULE);
        info!("Bot is ready!");
        info!("Logged in as: {} (ID: {})", self.user_name, self.user_id);
        info!("Connected to {} guild(s)", self.guild_count);
        info!("{}", self.mode_line);
        info!("{}", RULE);
    }
}

pub fn mode_line(config: &Config) -> String {
    match config.test_guild_id {
        Some(guild_id) => format!("Development Mode: Commands synced to guild {guild_id}"),
        None => "Production Mode: Commands synced globally".to_owned(),
    }
}

/// Same value on every call, so reconnects always land on the same presence.
pub fn ready_presence() -> (Option<ActivityData>, OnlineStatus) {
    (Some(ActivityData::listening("")), OnlineStatus::Online)
}

/// Runs on every `Ready`, including the ones that follow a reconnect.
pub fn on_ready(ctx: &serenity::Context, ready: &Ready, config: &Config) {
    SessionSummary::from_ready(ready, config).log();
    let (activity, status) = ready_presence();
    ctx.set_presence(activity, status);
}
