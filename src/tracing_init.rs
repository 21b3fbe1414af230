use std::io::Write;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, HandlerLayer, LambdaContext, LogConfig, Result, new_handler_with_context};

/// Install a global subscriber writing JSON lines to stdout.
///
/// Context attributes and the default level are read from the environment.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    init_logging_with_writer(std::io::stdout(), config, &LambdaContext::from_env())
}

/// Install a global subscriber writing to `writer`.
pub fn init_logging_with_writer<W>(writer: W, config: &LogConfig, context: &LambdaContext) -> Result<()>
where
    W: Write + Send + 'static,
{
    let handler = new_handler_with_context(writer, config, context);

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(HandlerLayer::new(handler))
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    tracing::debug!(format = ?config.format, "structured logging initialised");
    Ok(())
}

/// A target filter built from `RUST_LOG`, when it is set and non-empty.
fn env_filter() -> Result<Option<EnvFilter>> {
    match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => EnvFilter::try_new(&spec)
            .map(Some)
            .map_err(|e| Error::Init(e.to_string())),
        _ => Ok(None),
    }
}
