use std::time::Duration;

use tracing::info;

use super::{CommandList, Context, Error};
use crate::config::Mode;

/// Check the bot if it's ready to work
#[poise::command(prefix_command, slash_command)]
pub async fn health(ctx: Context<'_>) -> Result<(), Error> {
    info!("Channel {}: Health check received.", ctx.channel_id());
    let data = ctx.data();
    ctx.say(health_report(data.config.mode, data.loaded_extensions.len()))
        .await?;
    Ok(())
}

/// Show the gateway heartbeat latency
#[poise::command(prefix_command, slash_command, user_cooldown = 5)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("Pong! ({} ms)", latency.as_millis())).await?;
    Ok(())
}

/// Show how long the bot has been running
#[poise::command(prefix_command, slash_command)]
pub async fn uptime(ctx: Context<'_>) -> Result<(), Error> {
    let elapsed = ctx.data().started_at.elapsed();
    ctx.say(format!("Up for {}", format_uptime(elapsed))).await?;
    Ok(())
}

/// List the extensions loaded at startup
#[poise::command(prefix_command, slash_command, required_permissions = "MANAGE_GUILD")]
pub async fn extensions(ctx: Context<'_>) -> Result<(), Error> {
    let loaded = &ctx.data().loaded_extensions;
    let reply = if loaded.is_empty() {
        "No extensions are loaded.".to_owned()
    } else {
        let lines: Vec<String> = loaded.iter().map(|name| format!("• `{name}`")).collect();
        format!("Loaded extensions:\n{}", lines.join("\n"))
    };
    ctx.say(reply).await?;
    Ok(())
}

pub fn commands() -> CommandList {
    vec![health(), ping(), uptime(), extensions()]
}

fn health_report(mode: Mode, extension_count: usize) -> String {
    format!("I'm alive and healthy! Running in {mode} mode with {extension_count} extension(s) loaded.")
}

fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
