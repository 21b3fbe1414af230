//! Builder pattern for configuring handlers and initializing logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use lambdalog::{Format, Level};
//!
//! lambdalog::builder()
//!     .with_level(Level::Debug)
//!     .with_format(Format::Json)
//!     .init()
//!     .expect("Failed to initialize logging");
//!
//! tracing::info!(order_id = 42, "order accepted");
//! ```

use std::io::Write;

use crate::{Format, LambdaContext, LambdaHandler, Level, LogConfig, new_handler_with_context};

/// A builder for configuring handlers.
///
/// Without an explicit context, the context is captured from the process
/// environment when the handler is built.
#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
    config: LogConfig,
    context: Option<LambdaContext>,
}

impl LogBuilder {
    /// Create a new LogBuilder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self {
            config,
            context: None,
        }
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.config = self.config.with_format(format);
        self
    }

    /// Use an explicit context instead of reading the environment.
    pub fn with_context(mut self, context: LambdaContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Get the current configuration without building anything.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Build a handler writing to `writer`.
    pub fn handler<W: Write + Send>(self, writer: W) -> LambdaHandler<W> {
        let context = self.context.unwrap_or_else(LambdaContext::from_env);
        new_handler_with_context(writer, &self.config, &context)
    }

    /// Initialize global logging to stdout with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A global subscriber is already installed
    /// - `RUST_LOG` holds an invalid filter
    #[cfg(feature = "tracing-integration")]
    pub fn init(self) -> crate::Result<()> {
        let context = self.context.unwrap_or_else(LambdaContext::from_env);
        crate::init_logging_with_writer(std::io::stdout(), &self.config, &context)
    }
}
