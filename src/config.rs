use serde::{Deserialize, Serialize};

use crate::Level;

/// Output encoding of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One JSON object per line.
    #[default]
    Json,
    /// Space separated `key=value` pairs per line.
    Text,
}

/// Configuration for a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level (e.g., "debug", "info"). When unset the environment's
    /// log level is used, falling back to info.
    #[serde(default)]
    pub level: Option<Level>,
    /// Output format ("json" or "text")
    #[serde(default)]
    pub format: Format,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// The level floor applied when none is configured anywhere.
    pub(crate) fn min_level(&self) -> Level {
        self.level.unwrap_or(Level::Info)
    }
}
