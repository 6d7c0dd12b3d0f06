use std::future::Future;

use poise::serenity_prelude as serenity;
use serenity::{CreateCommand, GuildId};
use tracing::{debug, error, info};

use super::Error;
use crate::config::Config;

/// Where application commands get registered. A configured test guild gets
/// instant propagation, global registration can take up to an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Guild(GuildId),
    Global,
}

impl SyncTarget {
    pub fn for_config(config: &Config) -> Self {
        match config.test_guild_id {
            Some(guild_id) => SyncTarget::Guild(guild_id),
            None => SyncTarget::Global,
        }
    }

    pub fn synced_message(&self, count: usize) -> String {
        match self {
            SyncTarget::Guild(guild_id) => {
                format!("Synced {count} command(s) to test guild (ID: {guild_id})")
            }
            SyncTarget::Global => format!("Synced {count} command(s) globally"),
        }
    }

    pub fn propagation_note(&self) -> &'static str {
        match self {
            SyncTarget::Guild(_) => "Commands will be available instantly in the test guild!",
            SyncTarget::Global => "⚠️ Global commands may take up to 1 hour to appear",
        }
    }
}

/// The remote side of command registration. Both calls replace the whole
/// command set for their scope and report how many commands the platform kept.
pub trait CommandRegistry {
    fn set_guild_commands(
        &self,
        guild_id: GuildId,
        commands: Vec<CreateCommand>,
    ) -> impl Future<Output = Result<usize, Error>> + Send;

    fn set_global_commands(
        &self,
        commands: Vec<CreateCommand>,
    ) -> impl Future<Output = Result<usize, Error>> + Send;
}

impl CommandRegistry for serenity::Http {
    async fn set_guild_commands(
        &self,
        guild_id: GuildId,
        commands: Vec<CreateCommand>,
    ) -> Result<usize, Error> {
        let synced = guild_id.set_commands(self, commands).await?;
        Ok(synced.len())
    }

    async fn set_global_commands(&self, commands: Vec<CreateCommand>) -> Result<usize, Error> {
        let synced = serenity::Command::set_global_commands(self, commands).await?;
        Ok(synced.len())
    }
}

/// Registers `commands` in exactly one scope. Failures are logged and
/// swallowed so that startup carries on with whatever was registered before.
pub async fn synchronize<R>(
    registry: &R,
    target: SyncTarget,
    commands: Vec<CreateCommand>,
) -> Option<usize>
where
    R: CommandRegistry,
{
    info!("Syncing command tree...");
    let result = match target {
        SyncTarget::Guild(guild_id) => registry.set_guild_commands(guild_id, commands).await,
        SyncTarget::Global => registry.set_global_commands(commands).await,
    };

    match result {
        Ok(count) => {
            info!("✓ {}", target.synced_message(count));
            info!("  {}", target.propagation_note());
            Some(count)
        }
        Err(e) => {
            error!("✗ Failed to sync commands: {}", e);
            debug!("Sync failure details: {:?}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::Mode;

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Guild(GuildId, usize),
        Global(usize),
    }

    #[derive(Default)]
    struct RecordingRegistry {
        calls: Mutex<Vec<Call>>,
        fail: bool,
    }

    impl CommandRegistry for RecordingRegistry {
        async fn set_guild_commands(
            &self,
            guild_id: GuildId,
            commands: Vec<CreateCommand>,
        ) -> Result<usize, Error> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Guild(guild_id, commands.len()));
            if self.fail {
                return Err("guild registration rejected".into());
            }
            Ok(commands.len())
        }

        async fn set_global_commands(&self, commands: Vec<CreateCommand>) -> Result<usize, Error> {
            self.calls.lock().unwrap().push(Call::Global(commands.len()));
            if self.fail {
                return Err("global registration rejected".into());
            }
            Ok(commands.len())
        }
    }

    fn config_with_guild(test_guild_id: Option<&str>) -> Config {
        Config::from_lookup(Mode::Dev, |key| match key {
            "TEST_GUILD_ID" => test_guild_id.map(str::to_owned),
            _ => None,
        })
    }

    fn application_commands() -> Vec<CreateCommand> {
        poise::builtins::create_application_commands(&crate::discord::commands::commands())
    }

    #[test]
    fn target_follows_test_guild_id() {
        assert_eq!(
            SyncTarget::for_config(&config_with_guild(Some("12345"))),
            SyncTarget::Guild(GuildId::new(12345))
        );
        assert_eq!(SyncTarget::for_config(&config_with_guild(None)), SyncTarget::Global);
        assert_eq!(
            SyncTarget::for_config(&config_with_guild(Some("garbage"))),
            SyncTarget::Global
        );
    }

    #[test]
    fn log_lines_name_the_scope() {
        let guild = SyncTarget::Guild(GuildId::new(12345));
        assert_eq!(
            guild.synced_message(3),
            "Synced 3 command(s) to test guild (ID: 12345)"
        );
        assert_eq!(SyncTarget::Global.synced_message(3), "Synced 3 command(s) globally");
    }

    #[tokio::test]
    async fn test_guild_sync_never_touches_global_scope() {
        let registry = RecordingRegistry::default();
        let commands = application_commands();
        let expected = commands.len();
        let target = SyncTarget::for_config(&config_with_guild(Some("12345")));

        let synced = synchronize(&registry, target, commands).await;

        assert_eq!(synced, Some(expected));
        assert_eq!(
            *registry.calls.lock().unwrap(),
            vec![Call::Guild(GuildId::new(12345), expected)]
        );
    }

    #[tokio::test]
    async fn global_sync_never_touches_a_guild() {
        let registry = RecordingRegistry::default();
        let commands = application_commands();
        let expected = commands.len();

        let synced = synchronize(&registry, SyncTarget::Global, commands).await;

        assert_eq!(synced, Some(expected));
        assert_eq!(*registry.calls.lock().unwrap(), vec![Call::Global(expected)]);
    }

    #[tokio::test]
    async fn failed_sync_is_reported_not_raised() {
        let registry = RecordingRegistry {
            fail: true,
            ..Default::default()
        };

        let synced = synchronize(&registry, SyncTarget::Global, application_commands()).await;

        assert_eq!(synced, None);
        assert_eq!(registry.calls.lock().unwrap().len(), 1);
    }
}
