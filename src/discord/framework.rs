use std::sync::Arc;

use poise::serenity_prelude as serenity;
use serenity::{Client, GatewayIntents};
use tracing::info;

use super::{Error, errors, ready, sync};
use crate::{config::Config, data::DiscordData, extensions::LoadReport};

pub struct DiscordClient {
    pub serenity_client: Client,
}

impl DiscordClient {
    pub async fn new(
        token: &str,
        intents: GatewayIntents,
        config: Arc<Config>,
        extensions: LoadReport,
    ) -> anyhow::Result<Self> {
        let LoadReport {
            loaded, commands, ..
        } = extensions;

        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                commands,
                prefix_options: poise::PrefixFrameworkOptions {
                    prefix: Some(config.prefix.clone()),
                    case_insensitive_commands: true,
                    ..Default::default()
                },
                on_error: |error| Box::pin(errors::on_error(error)),
                event_handler: |ctx, event, framework, data| {
                    Box::pin(event_handler(ctx, event, framework, data))
                },
                ..Default::default()
            })
            .setup(move |ctx, _ready, framework| {
                Box::pin(async move {
                    let target = sync::SyncTarget::for_config(&config);
                    let commands =
                        poise::builtins::create_application_commands(&framework.options().commands);
                    sync::synchronize(&*ctx.http, target, commands).await;
                    info!("Startup complete, dispatching events");
                    Ok(DiscordData::new(config, loaded))
                })
            })
            .build();

        let client = serenity::ClientBuilder::new(token, intents)
            .framework(framework)
            .await;

        Ok(DiscordClient {
            serenity_client: client?,
        })
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, DiscordData, Error>,
    data: &DiscordData,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        ready::on_ready(ctx, data_about_bot, &data.config);
    }
    Ok(())
}
