//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults so the engine runs with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use deckforge_shared::constants::{
    DEFAULT_AUTOSAVE_MS, DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_HISTORY_LIMIT,
};

use crate::presentation::ContainerDimensions;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite file holding autosaved decks.
    /// Env: `DECKFORGE_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,

    /// Quiet period before an autosave is written.
    /// Env: `DECKFORGE_AUTOSAVE_MS`
    /// Default: 5000 ms
    pub autosave_quiet: Duration,

    /// Maximum undo snapshots kept.
    /// Env: `DECKFORGE_HISTORY_LIMIT`
    /// Default: 100
    pub history_limit: usize,

    /// Base URL of the slide-generation service.
    /// Env: `DECKFORGE_GENERATION_URL`
    /// Default: unset (generation disabled).
    pub generation_url: Option<String>,

    /// Env: `DECKFORGE_GENERATION_TIMEOUT_SECS`
    /// Default: 60 s
    pub generation_timeout: Duration,

    /// Size of the container handed to the presentation engine.
    /// Env: `DECKFORGE_PRESENT_WIDTH`, `DECKFORGE_PRESENT_HEIGHT`
    /// Default: 1280x720
    pub present_dimensions: ContainerDimensions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            autosave_quiet: Duration::from_millis(DEFAULT_AUTOSAVE_MS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            generation_url: None,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            present_dimensions: ContainerDimensions::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("DECKFORGE_DB_PATH") {
            if !path.trim().is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "DECKFORGE_AUTOSAVE_MS") {
            config.autosave_quiet = Duration::from_millis(ms);
        }

        if let Some(limit) = parse_var::<usize>(&lookup, "DECKFORGE_HISTORY_LIMIT") {
            if limit == 0 {
                tracing::warn!("DECKFORGE_HISTORY_LIMIT must be positive, using default");
            } else {
                config.history_limit = limit;
            }
        }

        if let Some(url) = lookup("DECKFORGE_GENERATION_URL") {
            if !url.trim().is_empty() {
                config.generation_url = Some(url.trim().to_string());
            }
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "DECKFORGE_GENERATION_TIMEOUT_SECS") {
            config.generation_timeout = Duration::from_secs(secs);
        }

        if let Some(width) = parse_var::<u32>(&lookup, "DECKFORGE_PRESENT_WIDTH") {
            config.present_dimensions.width = width;
        }
        if let Some(height) = parse_var::<u32>(&lookup, "DECKFORGE_PRESENT_HEIGHT") {
            config.present_dimensions.height = height;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "invalid value, using default");
            None
        }
    }
}
