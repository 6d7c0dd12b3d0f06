use std::{sync::Arc, time::Instant};

use crate::config::Config;

/// Shared state handed to every command by the framework.
pub struct DiscordData {
    pub config: Arc<Config>,
    pub started_at: Instant,
    pub loaded_extensions: Vec<String>,
}

impl DiscordData {
    pub fn new(config: Arc<Config>, loaded_extensions: Vec<String>) -> Self {
        Self {
            config,
            started_at: Instant::now(),
            loaded_extensions,
        }
    }
}
