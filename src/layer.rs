//! Bridge from `tracing` events to a [`Handler`].

use std::fmt;

use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record as SpanRecord};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::{Attr, Handler, Level, Record};

/// A `tracing_subscriber` layer that encodes every enabled event through a
/// [`Handler`].
///
/// Event fields become call-site attributes; the `message` field becomes the
/// record message. Fields recorded on enclosing spans are emitted before the
/// event's own fields, outermost span first. `TRACE` events are never
/// enabled.
pub struct HandlerLayer<H> {
    handler: H,
    log_internal_errors: bool,
}

impl<H: Handler> HandlerLayer<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            log_internal_errors: true,
        }
    }

    /// Whether write failures are reported on stderr. Enabled by default.
    pub fn with_internal_errors(mut self, enabled: bool) -> Self {
        self.log_internal_errors = enabled;
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Fields recorded on a span, stored in its extensions.
struct SpanFields(Vec<Attr>);

impl<S, H> Layer<S> for HandlerLayer<H>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    H: Handler + 'static,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        if metadata.is_span() {
            return true;
        }
        Level::from_tracing(metadata.level()).is_some_and(|level| self.handler.enabled(level))
    }

    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.attrs));
    }

    fn on_record(&self, id: &Id, values: &SpanRecord<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.0.extend(visitor.attrs),
            None => extensions.insert(SpanFields(visitor.attrs)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(level) = Level::from_tracing(event.metadata().level()) else {
            return;
        };
        if !self.handler.enabled(level) {
            return;
        }

        let mut attrs = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    attrs.extend(fields.0.iter().cloned());
                }
            }
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        attrs.extend(visitor.attrs);

        let record = Record::new(level, visitor.message.unwrap_or_default())
            .with_time(now())
            .with_attrs(attrs);

        if let Err(err) = self.handler.handle(&record)
            && self.log_internal_errors
        {
            eprintln!("[lambdalog] unable to write log record: {}", err);
        }
    }
}

#[cfg(feature = "local-offset")]
fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(not(feature = "local-offset"))]
fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Collects `tracing` fields as attributes.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    attrs: Vec<Attr>,
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.attrs.push(Attr::float(field.name(), value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.attrs.push(Attr::int(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.attrs.push(Attr::uint(field.name(), value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.attrs.push(Attr::bool(field.name(), value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.attrs.push(Attr::string(field.name(), value));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.attrs.push(Attr::string(field.name(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.attrs.push(Attr::string(field.name(), format!("{:?}", value)));
        }
    }
}
