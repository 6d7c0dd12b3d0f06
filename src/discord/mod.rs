pub mod commands;
pub mod errors;
pub mod framework;
pub mod ready;
pub mod sync;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, crate::data::DiscordData, Error>;
/// Banner separator for startup and ready logs.
pub const RULE: &str = "--------------------------------------------------";

pub type CommandList = Vec<poise::Command<crate::data::DiscordData, Error>>;
