//! Translation of framework errors into user-facing replies.
//!
//! Every failed invocation is classified into a [`CommandFailure`], then
//! answered through the handler that matches how the command was invoked:
//! a channel message for prefix commands, an ephemeral interaction reply for
//! slash commands.

use std::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use poise::{FrameworkError, serenity_prelude as serenity};
use serenity::{
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
};
use tracing::{error, warn};

use super::{Context, Error};
use crate::data::DiscordData;

pub static GENERIC_FAILURE: &str = "❌ An error occurred while executing the command.";

#[derive(Debug, Clone, PartialEq)]
pub enum CommandFailure {
    /// The user typed something that is not a command.
    NotFound,
    MissingArgument { name: String },
    BadArgument,
    MissingPermissions,
    BotMissingPermissions,
    Cooldown { retry_after: Duration },
    CheckFailure,
    /// Anything the bot has no tailored message for.
    Unknown { description: String },
}

impl CommandFailure {
    pub fn from_framework_error(error: &FrameworkError<'_, DiscordData, Error>) -> Self {
        match error {
            FrameworkError::UnknownCommand { .. } | FrameworkError::UnknownInteraction { .. } => {
                CommandFailure::NotFound
            }
            FrameworkError::ArgumentParse { error, ctx, .. }
                if is_missing_argument(&**error) =>
            {
                CommandFailure::MissingArgument {
                    name: missing_parameter_name(*ctx),
                }
            }
            FrameworkError::ArgumentParse { .. } => CommandFailure::BadArgument,
            FrameworkError::MissingUserPermissions { .. } => CommandFailure::MissingPermissions,
            FrameworkError::MissingBotPermissions { .. } => CommandFailure::BotMissingPermissions,
            FrameworkError::CooldownHit {
                remaining_cooldown, ..
            } => CommandFailure::Cooldown {
                retry_after: *remaining_cooldown,
            },
            FrameworkError::CommandCheckFailed { .. }
            | FrameworkError::NotAnOwner { .. }
            | FrameworkError::GuildOnly { .. }
            | FrameworkError::DmOnly { .. }
            | FrameworkError::NsfwOnly { .. } => CommandFailure::CheckFailure,
            FrameworkError::Command { error, .. } => CommandFailure::Unknown {
                description: format!("{error:?}"),
            },
            FrameworkError::CommandPanic { payload, .. } => CommandFailure::Unknown {
                description: payload
                    .clone()
                    .unwrap_or_else(|| "command panicked without a payload".to_owned()),
            },
            other => CommandFailure::Unknown {
                description: other.to_string(),
            },
        }
    }

    /// The reply for this failure. `None` means the failure stays silent.
    pub fn message(&self) -> Option<String> {
        let message = match self {
            CommandFailure::NotFound => return None,
            CommandFailure::MissingArgument { name } => {
                format!("❌ Missing required argument: `{name}`")
            }
            CommandFailure::BadArgument => "❌ Invalid argument provided.".to_owned(),
            CommandFailure::MissingPermissions => {
                "❌ You don't have permission to use this command.".to_owned()
            }
            CommandFailure::BotMissingPermissions => {
                "❌ I don't have the necessary permissions to execute this command.".to_owned()
            }
            CommandFailure::Cooldown { retry_after } => format!(
                "⏱️ This command is on cooldown. Try again in {:.1}s.",
                retry_after.as_secs_f64()
            ),
            CommandFailure::CheckFailure => "❌ You cannot use this command.".to_owned(),
            CommandFailure::Unknown { .. } => GENERIC_FAILURE.to_owned(),
        };
        Some(message)
    }
}

/// Prefix parsing reports running out of input as `TooFewArguments`,
/// every other parse error means the input was there but malformed.
fn is_missing_argument(error: &(dyn std::error::Error + Send + Sync + 'static)) -> bool {
    error.is::<poise::TooFewArguments>()
}

/// Where a translated failure message goes.
pub trait ReplySink {
    fn send_reply(&self, content: String) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Plain channel message, used for prefix commands.
pub struct ChannelReply<'a> {
    ctx: Context<'a>,
}

impl ReplySink for ChannelReply<'_> {
    async fn send_reply(&self, content: String) -> Result<(), Error> {
        self.ctx
            .channel_id()
            .say(self.ctx.http(), content)
            .await?;
        Ok(())
    }
}

/// Ephemeral interaction reply, used for slash commands.
pub struct InteractionReply<'a> {
    ctx: poise::ApplicationContext<'a, DiscordData, Error>,
}

impl ReplySink for InteractionReply<'_> {
    async fn send_reply(&self, content: String) -> Result<(), Error> {
        let ctx = self.ctx;
        match ReplyMethod::for_interaction(ctx.has_sent_initial_response) {
            ReplyMethod::InitialResponse => {
                let response = CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(content)
                        .ephemeral(true),
                );
                ctx.interaction
                    .create_response(ctx.serenity_context, response)
                    .await?;
                ctx.has_sent_initial_response.store(true, Ordering::SeqCst);
            }
            ReplyMethod::FollowUp => {
                let followup = CreateInteractionResponseFollowup::new()
                    .content(content)
                    .ephemeral(true);
                ctx.interaction
                    .create_followup(ctx.serenity_context, followup)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Sends the message for `failure`, logging the details of unexpected ones
/// first. Returns `None` when the failure stays silent.
pub async fn deliver<S>(
    sink: &S,
    failure: &CommandFailure,
    origin: &str,
) -> Option<Result<(), Error>>
where
    S: ReplySink,
{
    let message = failure.message()?;
    if let CommandFailure::Unknown { description } = failure {
        error!("Error in {}: {}", origin, description);
    }
    Some(sink.send_reply(message).await)
}

/// Interactions accept exactly one initial response, everything after it
/// has to go through a follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMethod {
    InitialResponse,
    FollowUp,
}

impl ReplyMethod {
    pub fn for_interaction(has_sent_initial_response: &AtomicBool) -> Self {
        if has_sent_initial_response.load(Ordering::SeqCst) {
            ReplyMethod::FollowUp
        } else {
            ReplyMethod::InitialResponse
        }
    }
}

/// Entry point registered as the framework's `on_error`. Never fails.
pub async fn on_error(error: FrameworkError<'_, DiscordData, Error>) {
    match &error {
        FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
            return;
        }
        FrameworkError::EventHandler { error, .. } => {
            error!("Error in event handler: {:?}", error);
            return;
        }
        FrameworkError::CommandCheckFailed {
            error: Some(error),
            ctx,
            ..
        } => {
            warn!(
                "Check for command {} failed with an error: {:?}",
                ctx.command().qualified_name,
                error
            );
        }
        _ => {}
    }

    let failure = CommandFailure::from_framework_error(&error);
    if failure == CommandFailure::NotFound {
        return;
    }

    let Some(ctx) = error.ctx() else {
        error!("Unhandled framework error: {}", error);
        return;
    };

    match ctx {
        poise::Context::Prefix(_) => handle_text_command_error(ctx, &failure).await,
        poise::Context::Application(app_ctx) => {
            handle_interaction_error(app_ctx, &failure).await
        }
    }
}

pub async fn handle_text_command_error(ctx: Context<'_>, failure: &CommandFailure) {
    let origin = format!("command {}", ctx.command().qualified_name);
    if let Some(Err(e)) = deliver(&ChannelReply { ctx }, failure, &origin).await {
        error!("Error while sending error message: {:?}", e);
    }
}

pub async fn handle_interaction_error(
    ctx: poise::ApplicationContext<'_, DiscordData, Error>,
    failure: &CommandFailure,
) {
    let origin = format!("slash command {}", ctx.command.qualified_name);
    // The interaction may have expired already, nobody is left to tell.
    let _ = deliver(&InteractionReply { ctx }, failure, &origin).await;
}

fn missing_parameter_name(ctx: Context<'_>) -> String {
    let supplied = match ctx {
        poise::Context::Prefix(prefix_ctx) => count_arguments(prefix_ctx.args),
        poise::Context::Application(_) => 0,
    };
    let parameters = ctx
        .command()
        .parameters
        .iter()
        .map(|parameter| (parameter.name.as_str(), parameter.required));
    missing_parameter(parameters, supplied).unwrap_or_else(|| "argument".to_owned())
}

/// Prefix arguments are filled left to right, so the first required
/// parameter past the supplied ones is the one that ran out of input.
fn missing_parameter<'a>(
    parameters: impl IntoIterator<Item = (&'a str, bool)>,
    supplied: usize,
) -> Option<String> {
    let parameters: Vec<(&str, bool)> = parameters.into_iter().collect();
    parameters
        .iter()
        .skip(supplied)
        .chain(parameters.iter())
        .find(|(_, required)| *required)
        .map(|(name, _)| (*name).to_owned())
}

/// Splits the way poise's prefix parser does: whitespace separated, double
/// quotes group words, a backslash makes the next character literal.
fn count_arguments(args: &str) -> usize {
    let mut count = 0;
    let mut in_argument = false;
    let mut in_quotes = false;
    let mut escaping = false;
    for c in args.chars() {
        if !in_argument {
            if c.is_whitespace() {
                continue;
            }
            in_argument = true;
            count += 1;
        }
        if escaping {
            escaping = false;
        } else if c.is_whitespace() && !in_quotes {
            in_argument = false;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c == '\\' {
            escaping = true;
        }
    }
    count
}
