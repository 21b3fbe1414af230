//! The handler contract and its two implementations.
//!
//! [`EncodingHandler`] is the terminal link of a chain: it turns records into
//! lines and writes them to a sink. [`ContextHandler`] decorates any other
//! handler, folding the Lambda context attributes in once and adding its own
//! level floor.

use std::io::Write;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::state::EncodeState;
use crate::writer::LockedWriter;
use crate::{Attr, LambdaContext, Level, LogConfig, Record, Result};

/// Key of the record level.
pub const LEVEL_KEY: &str = "level";
/// Key of the record message.
pub const MESSAGE_KEY: &str = "message";
/// Key of the record timestamp, written only when the record has one.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// A sink for log records that can be decorated and derived.
///
/// Derived handlers returned by [`with_attrs`](Handler::with_attrs) and
/// [`with_group`](Handler::with_group) are new values; the receiver is never
/// modified, so handlers can be shared freely between threads.
pub trait Handler: Send + Sync {
    /// Whether records at `level` would be handled.
    fn enabled(&self, level: Level) -> bool;

    /// Encode and write a record. Callers check [`enabled`](Handler::enabled)
    /// first.
    fn handle(&self, record: &Record) -> Result<()>;

    /// A handler that also emits `attrs` on every record, inside the
    /// innermost open group.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Self
    where
        Self: Sized;

    /// A handler that nests all attributes added later under `name`.
    /// An empty name returns an equivalent handler.
    fn with_group(&self, name: &str) -> Self
    where
        Self: Sized;
}

enum Scope {
    Attrs(Vec<Attr>),
    Group(String),
}

/// One link of a persistent list shared between a handler and its derivations.
struct ScopeNode {
    scope: Scope,
    parent: Option<Arc<ScopeNode>>,
}

struct Shared<W> {
    sink: LockedWriter<W>,
    pool: Arc<BufferPool>,
}

/// Encodes records as JSON (or text) lines and writes them to `W`.
pub struct EncodingHandler<W> {
    shared: Arc<Shared<W>>,
    config: LogConfig,
    scope: Option<Arc<ScopeNode>>,
}

impl<W> Clone for EncodingHandler<W> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<W: Write + Send> EncodingHandler<W> {
    /// Create a handler that draws buffers from the global pool.
    pub fn new(writer: W, config: &LogConfig) -> Self {
        Self::with_pool(writer, config, BufferPool::global())
    }

    /// Create a handler that draws buffers from `pool`.
    pub fn with_pool(writer: W, config: &LogConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink: LockedWriter::new(writer),
                pool,
            }),
            config: config.clone(),
            scope: None,
        }
    }

    /// Flush the sink.
    pub fn flush(&self) -> Result<()> {
        self.shared.sink.flush()?;
        Ok(())
    }

    fn push(&self, scope: Scope) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
            scope: Some(Arc::new(ScopeNode {
                scope,
                parent: self.scope.clone(),
            })),
        }
    }

    fn encode<'a>(&'a self, state: &mut EncodeState<'a>, record: &Record) -> Result<()> {
        state.open_object();

        state.append_key(LEVEL_KEY);
        state.append_string(record.level().as_str());

        if let Some(time) = record.time() {
            state.append_key(TIMESTAMP_KEY);
            state.append_time(time)?;
        }

        state.append_key(MESSAGE_KEY);
        state.append_string(record.message());

        let mut chain = Vec::new();
        let mut node = self.scope.as_deref();
        while let Some(n) = node {
            chain.push(n);
            node = n.parent.as_deref();
        }
        for node in chain.into_iter().rev() {
            match &node.scope {
                Scope::Attrs(attrs) => {
                    for attr in attrs {
                        state.append_attr(attr)?;
                    }
                }
                Scope::Group(name) => state.begin_group(name),
            }
        }

        for attr in record.attrs() {
            state.append_attr(attr)?;
        }
        state.end_groups();

        state.close_object();
        Ok(())
    }
}

impl<W: Write + Send> Handler for EncodingHandler<W> {
    fn enabled(&self, level: Level) -> bool {
        level >= self.config.min_level()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        // The buffer goes back to the pool when `state` drops, on every path.
        let mut state = EncodeState::new(self.shared.pool.acquire(), self.config.format);
        self.encode(&mut state, record)?;
        self.shared.sink.write_line(state.bytes())?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        if attrs.is_empty() {
            return self.clone();
        }
        self.push(Scope::Attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Self {
        if name.is_empty() {
            return self.clone();
        }
        self.push(Scope::Group(name.to_string()))
    }
}

/// Decorates a handler with the Lambda context attributes and a level floor.
#[derive(Debug, Clone)]
pub struct ContextHandler<H> {
    inner: H,
    level: Level,
}

impl<H: Handler> ContextHandler<H> {
    /// Wrap `inner`, attaching the context attributes to it once.
    ///
    /// The floor is `level`, else the context's log level, else info.
    pub fn new(inner: H, context: &LambdaContext, level: Option<Level>) -> Self {
        Self {
            inner: inner.with_attrs(context.attrs()),
            level: level.or(context.log_level).unwrap_or(Level::Info),
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Handler> Handler for ContextHandler<H> {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level && self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        self.inner.handle(record)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        Self {
            inner: self.inner.with_attrs(attrs),
            level: self.level,
        }
    }

    fn with_group(&self, name: &str) -> Self {
        Self {
            inner: self.inner.with_group(name),
            level: self.level,
        }
    }
}

/// The handler chain built by [`new_handler`].
pub type LambdaHandler<W> = ContextHandler<EncodingHandler<W>>;

/// Create a handler writing to `writer`, enriched with the context captured
/// from the process environment.
pub fn new_handler<W: Write + Send>(writer: W, config: &LogConfig) -> LambdaHandler<W> {
    new_handler_with_context(writer, config, &LambdaContext::from_env())
}

/// Create a handler writing to `writer`, enriched with `context`.
///
/// The level floor is resolved once (config, then context, then info) and
/// applied to both links of the chain.
pub fn new_handler_with_context<W: Write + Send>(
    writer: W,
    config: &LogConfig,
    context: &LambdaContext,
) -> LambdaHandler<W> {
    let level = config.level.or(context.log_level);
    let config = LogConfig {
        level,
        ..config.clone()
    };
    ContextHandler::new(EncodingHandler::new(writer, &config), context, level)
}
