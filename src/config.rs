use std::{collections::HashMap, env, fmt, path::Path};

use anyhow::{Result, anyhow};
use poise::serenity_prelude::GuildId;
use tracing::{debug, warn};

pub static DEFAULT_PREFIX: &str = "!";

/// Deployment mode, selected by the `ENVIRONMENT` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Dev,
    Prod,
}

impl Mode {
    /// Anything other than `prod` falls back to development.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("prod") => Mode::Prod,
            _ => Mode::Dev,
        }
    }

    pub fn env_file(self) -> &'static str {
        match self {
            Mode::Prod => ".env.production",
            Mode::Dev => ".env.development",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Dev => f.write_str("dev"),
            Mode::Prod => f.write_str("prod"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub token: Option<String>,
    pub prefix: String,
    pub mode: Mode,
    pub test_guild_id: Option<GuildId>,
}

impl Config {
    /// Reads the mode from the process environment, then resolves every other
    /// key from the process environment first and the mode's env file second.
    /// The process environment itself is left untouched.
    pub fn load() -> Self {
        let mode = Mode::from_flag(env::var("ENVIRONMENT").ok().as_deref());
        let file_vars = read_env_file(mode.env_file());
        Self::from_layers(mode, |key| env::var(key).ok(), &file_vars)
    }

    pub fn from_layers<F>(mode: Mode, process: F, file_vars: &HashMap<String, String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(mode, |key| {
            process(key).or_else(|| file_vars.get(key).cloned())
        })
    }

    pub fn from_lookup<F>(mode: Mode, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN").filter(|token| !token.is_empty());
        let prefix = lookup("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_owned());
        // Unparseable ids are dropped silently, 0 is not a valid snowflake.
        let test_guild_id = lookup("TEST_GUILD_ID")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|id| *id != 0)
            .map(GuildId::new);

        Config {
            token,
            prefix,
            mode,
            test_guild_id,
        }
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            anyhow!(
                "DISCORD_TOKEN is not set, add it to the environment or to {}",
                self.mode.env_file()
            )
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("prefix", &self.prefix)
            .field("mode", &self.mode)
            .field("test_guild_id", &self.test_guild_id)
            .finish()
    }
}

/// A missing file is not an error, the bot runs on the process environment alone.
pub fn read_env_file(path: impl AsRef<Path>) -> HashMap<String, String> {
    let path = path.as_ref();
    let iter = match dotenvy::from_filename_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            debug!("No env file at {}", path.display());
            return HashMap::new();
        }
        Err(e) => {
            warn!("Could not read env file {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => warn!("Skipping malformed line in {}: {}", path.display(), e),
        }
    }
    debug!("Read {} variable(s) from {}", vars.len(), path.display());
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn mode_selects_env_file() {
        assert_eq!(Mode::from_flag(Some("prod")), Mode::Prod);
        assert_eq!(Mode::from_flag(Some("dev")), Mode::Dev);
        assert_eq!(Mode::from_flag(Some("staging")), Mode::Dev);
        assert_eq!(Mode::from_flag(None), Mode::Dev);
        assert_eq!(Mode::Prod.env_file(), ".env.production");
        assert_eq!(Mode::Dev.env_file(), ".env.development");
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(Mode::Dev, |_| None);
        assert_eq!(config.token, None);
        assert_eq!(config.prefix, "!");
        assert_eq!(config.test_guild_id, None);
        assert!(config.require_token().is_err());
    }

    #[test]
    fn reads_all_keys() {
        let config = Config::from_lookup(
            Mode::Prod,
            lookup_from(&[
                ("DISCORD_TOKEN", "abc.def"),
                ("COMMAND_PREFIX", "$"),
                ("TEST_GUILD_ID", "12345"),
            ]),
        );
        assert_eq!(config.require_token().unwrap(), "abc.def");
        assert_eq!(config.prefix, "$");
        assert_eq!(config.mode, Mode::Prod);
        assert_eq!(config.test_guild_id, Some(GuildId::new(12345)));
    }

    #[test]
    fn bad_test_guild_id_is_dropped() {
        for raw in ["not-a-number", "", "0", "-4", "1.5"] {
            let config = Config::from_lookup(Mode::Dev, lookup_from(&[("TEST_GUILD_ID", raw)]));
            assert_eq!(config.test_guild_id, None, "input {raw:?}");
        }
    }

    #[test]
    fn process_env_wins_over_file() {
        let file_vars = HashMap::from([
            ("COMMAND_PREFIX".to_owned(), "?".to_owned()),
            ("DISCORD_TOKEN".to_owned(), "from-file".to_owned()),
        ]);
        let config = Config::from_layers(
            Mode::Dev,
            lookup_from(&[("DISCORD_TOKEN", "from-process")]),
            &file_vars,
        );
        assert_eq!(config.token.as_deref(), Some("from-process"));
        assert_eq!(config.prefix, "?");
    }

    #[test]
    fn debug_output_hides_token() {
        let config = Config::from_lookup(Mode::Dev, lookup_from(&[("DISCORD_TOKEN", "secret")]));
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn reads_env_file_and_tolerates_missing_one() {
        let dir = env::temp_dir().join(format!("plutus-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env.development");
        std::fs::write(&path, "DISCORD_TOKEN=file-token\n# comment\nTEST_GUILD_ID=42\n").unwrap();

        let vars = read_env_file(&path);
        assert_eq!(vars.get("DISCORD_TOKEN").map(String::as_str), Some("file-token"));
        assert_eq!(vars.get("TEST_GUILD_ID").map(String::as_str), Some("42"));

        assert!(read_env_file(dir.join("does-not-exist")).is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
