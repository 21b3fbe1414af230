//! # Lambdalog
//!
//! A structured log handler that writes one JSON object per record, enriched
//! with fields captured once from the AWS Lambda environment, in the line
//! format used by the Lambda Powertools libraries.
//!
//! ## Features
//!
//! - Allocation-conscious encoding through a pooled byte buffer
//! - JSON string escaping without HTML escaping
//! - Composable handler chains with attribute and group derivation
//! - JSON or `key=value` text output
//! - Integration with the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust
//! use lambdalog::{Attr, Handler, LambdaContext, Level, LogConfig, Record};
//!
//! let context = LambdaContext::new().with_service("orders").with_memory_size(256);
//! let handler = lambdalog::new_handler_with_context(std::io::stdout(), &LogConfig::new(), &context)
//!     .with_attrs(vec![Attr::string("region", "eu-west-1")]);
//!
//! let record = Record::new(Level::Info, "order accepted").with_attr(Attr::int("order_id", 42));
//! if handler.enabled(record.level()) {
//!     handler.handle(&record)?;
//! }
//! # Ok::<(), lambdalog::Error>(())
//! ```

pub mod attr;
pub mod buffer;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod escape;
pub mod handler;
pub mod level;
pub mod state;
pub mod writer;

#[cfg(feature = "tracing-integration")]
pub mod layer;
#[cfg(feature = "tracing-integration")]
pub mod tracing_init;

pub use attr::{Attr, Record, Value};
pub use buffer::{BufferPool, PooledBuffer};
pub use builder::LogBuilder;
pub use config::{Format, LogConfig};
pub use context::LambdaContext;
pub use error::{Error, Result};
pub use handler::{
    ContextHandler, EncodingHandler, Handler, LEVEL_KEY, LambdaHandler, MESSAGE_KEY,
    TIMESTAMP_KEY, new_handler, new_handler_with_context,
};
pub use level::Level;
pub use state::EncodeState;
pub use writer::LockedWriter;

#[cfg(feature = "tracing-integration")]
pub use layer::HandlerLayer;
#[cfg(feature = "tracing-integration")]
pub use tracing_init::{init_logging, init_logging_with_writer};

/// Create a new [`LogBuilder`].
pub fn builder() -> LogBuilder {
    LogBuilder::new()
}
