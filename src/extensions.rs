//! Named bundles of commands that can be loaded at startup.
//!
//! Extensions are resolved by name against a static catalogue. Loading is
//! best effort: a failing extension is reported and skipped, the rest of the
//! list still loads.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::discord::CommandList;

pub static DEFAULT_EXTENSIONS: &[&str] = &["cogs.general"];

pub struct Cog {
    pub name: &'static str,
    pub commands: fn() -> CommandList,
}

pub fn catalogue() -> Vec<Cog> {
    vec![Cog {
        name: "cogs.general",
        commands: crate::discord::commands::commands,
    }]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("extension '{0}' could not be found")]
    NotFound(String),
    #[error("extension '{0}' is already loaded")]
    AlreadyLoaded(String),
    #[error("command '{command}' from extension '{extension}' is already registered")]
    CommandConflict { extension: String, command: String },
}

pub struct ExtensionLoader {
    catalogue: Vec<Cog>,
    loaded: Vec<String>,
    commands: CommandList,
}

impl ExtensionLoader {
    pub fn new(catalogue: Vec<Cog>) -> Self {
        Self {
            catalogue,
            loaded: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Loads one extension, returning how many commands it contributed.
    /// An extension whose command names clash with loaded ones is rejected whole.
    pub fn load(&mut self, name: &str) -> Result<usize, ExtensionError> {
        if self.loaded.iter().any(|loaded| loaded == name) {
            return Err(ExtensionError::AlreadyLoaded(name.to_owned()));
        }
        let cog = self
            .catalogue
            .iter()
            .find(|cog| cog.name == name)
            .ok_or_else(|| ExtensionError::NotFound(name.to_owned()))?;

        let new_commands = (cog.commands)();
        let taken: HashSet<&str> = self.commands.iter().map(|c| c.name.as_str()).collect();
        if let Some(clash) = new_commands.iter().find(|c| taken.contains(c.name.as_str())) {
            return Err(ExtensionError::CommandConflict {
                extension: name.to_owned(),
                command: clash.name.clone(),
            });
        }

        let count = new_commands.len();
        self.commands.extend(new_commands);
        self.loaded.push(name.to_owned());
        Ok(count)
    }

    pub fn load_all<I, S>(mut self, names: I) -> LoadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for name in names {
            let name = name.as_ref();
            let outcome = self.load(name);
            match &outcome {
                Ok(count) => info!("✓ Loaded extension: {} ({} command(s))", name, count),
                Err(e) => error!("✗ Failed to load extension {}: {:?}", name, e),
            }
            outcomes.push((name.to_owned(), outcome));
        }

        let report = LoadReport {
            outcomes,
            loaded: self.loaded,
            commands: self.commands,
        };
        report.log_summary();
        report
    }
}

pub struct LoadReport {
    pub outcomes: Vec<(String, Result<usize, ExtensionError>)>,
    pub loaded: Vec<String>,
    pub commands: CommandList,
}

impl LoadReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ExtensionError)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().err().map(|e| (name.as_str(), e)))
    }

    fn log_summary(&self) {
        let failed = self.failures().count();
        if failed == 0 {
            info!(
                "Loaded {} extension(s) with {} command(s)",
                self.loaded.len(),
                self.commands.len()
            );
        } else {
            warn!(
                "Loaded {}/{} extension(s) with {} command(s), {} failed",
                self.loaded.len(),
                self.outcomes.len(),
                self.commands.len(),
                failed
            );
        }
    }
}
