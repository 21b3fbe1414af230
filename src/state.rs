//! Per-record encoding state.

use std::io::Write;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::attr::{Attr, Value};
use crate::buffer::PooledBuffer;
use crate::escape::append_escaped_str;
use crate::{Format, Result};

/// Encodes a single record into a pooled buffer.
///
/// Tracks the separator to write before the next key and, for every nested
/// object currently open, the separator to restore once it closes. In text
/// mode nesting is expressed as a dotted key prefix instead.
///
/// Groups inherited from a handler chain are registered with
/// [`begin_group`](Self::begin_group) and only opened once an attribute is
/// written inside them, so a group that ends up empty leaves no trace.
pub struct EncodeState<'a> {
    buf: PooledBuffer,
    format: Format,
    sep: Option<u8>,
    saved_seps: Vec<Option<u8>>,
    prefix: String,
    prefix_marks: Vec<usize>,
    pending: Vec<&'a str>,
    opened: usize,
}

impl<'a> EncodeState<'a> {
    pub fn new(buf: PooledBuffer, format: Format) -> Self {
        Self {
            buf,
            format,
            sep: None,
            saved_seps: Vec::new(),
            prefix: String::new(),
            prefix_marks: Vec::new(),
            pending: Vec::new(),
            opened: 0,
        }
    }

    /// The bytes encoded so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn open_object(&mut self) {
        if self.format == Format::Json {
            self.buf.push(b'{');
        }
    }

    /// Terminate the record: closes the top-level object and ends the line.
    pub fn close_object(&mut self) {
        if self.format == Format::Json {
            self.buf.push(b'}');
        }
        self.buf.push(b'\n');
    }

    pub fn append_key(&mut self, name: &str) {
        if let Some(sep) = self.sep {
            self.buf.push(sep);
        }
        match self.format {
            Format::Json => {
                self.append_quoted(name);
                self.buf.push(b':');
                self.sep = Some(b',');
            }
            Format::Text => {
                if self.prefix.is_empty() {
                    self.append_text(name);
                } else {
                    let key = format!("{}{}", self.prefix, name);
                    self.append_text(&key);
                }
                self.buf.push(b'=');
                self.sep = Some(b' ');
            }
        }
    }

    pub fn append_string(&mut self, value: &str) {
        match self.format {
            Format::Json => self.append_quoted(value),
            Format::Text => self.append_text(value),
        }
    }

    /// Append an extended ISO-8601 timestamp with millisecond precision and a
    /// numeric UTC offset, e.g. `2024-01-15T10:30:00.123+00:00`.
    pub fn append_time(&mut self, time: OffsetDateTime) -> Result<()> {
        let format = format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
        );
        let json = self.format == Format::Json;
        if json {
            self.buf.push(b'"');
        }
        time.format_into(&mut *self.buf, format)?;
        if json {
            self.buf.push(b'"');
        }
        Ok(())
    }

    pub fn append_int(&mut self, value: i64) {
        // Writing into a Vec cannot fail.
        let _ = write!(self.buf, "{}", value);
    }

    pub fn append_uint(&mut self, value: u64) {
        let _ = write!(self.buf, "{}", value);
    }

    /// Non-finite values have no JSON literal and are written as strings.
    pub fn append_float(&mut self, value: f64) {
        if value.is_finite() {
            let _ = write!(self.buf, "{}", value);
        } else if value.is_nan() {
            self.append_string("NaN");
        } else if value.is_sign_positive() {
            self.append_string("+Inf");
        } else {
            self.append_string("-Inf");
        }
    }

    pub fn append_bool(&mut self, value: bool) {
        let literal: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(literal);
    }

    /// Open a nested object keyed by `name`.
    pub fn open_group(&mut self, name: &str) {
        match self.format {
            Format::Json => {
                self.append_key(name);
                self.buf.push(b'{');
                self.saved_seps.push(self.sep.take());
            }
            Format::Text => {
                self.prefix_marks.push(self.prefix.len());
                self.prefix.push_str(name);
                self.prefix.push('.');
            }
        }
    }

    /// Close the innermost object opened by [`open_group`](Self::open_group).
    pub fn close_group(&mut self) {
        match self.format {
            Format::Json => {
                self.buf.push(b'}');
                self.sep = self.saved_seps.pop().flatten();
            }
            Format::Text => {
                if let Some(mark) = self.prefix_marks.pop() {
                    self.prefix.truncate(mark);
                }
            }
        }
    }

    /// Register a group whose object is opened lazily before the next attribute.
    pub fn begin_group(&mut self, name: &'a str) {
        self.pending.push(name);
    }

    /// Close every group registered with [`begin_group`](Self::begin_group)
    /// that was actually opened, innermost first.
    pub fn end_groups(&mut self) {
        self.pending.clear();
        for _ in 0..self.opened {
            self.close_group();
        }
        self.opened = 0;
    }

    /// Append a key/value pair, descending into group values.
    pub fn append_attr(&mut self, attr: &Attr) -> Result<()> {
        if attr.is_omitted() {
            return Ok(());
        }
        self.open_pending();
        match attr.value() {
            Value::Group(attrs) => {
                let named = !attr.key().is_empty();
                if named {
                    self.open_group(attr.key());
                }
                for attr in attrs {
                    self.append_attr(attr)?;
                }
                if named {
                    self.close_group();
                }
            }
            Value::String(v) => {
                self.append_key(attr.key());
                self.append_string(v);
            }
            Value::Int(v) => {
                self.append_key(attr.key());
                self.append_int(*v);
            }
            Value::Uint(v) => {
                self.append_key(attr.key());
                self.append_uint(*v);
            }
            Value::Float(v) => {
                self.append_key(attr.key());
                self.append_float(*v);
            }
            Value::Bool(v) => {
                self.append_key(attr.key());
                self.append_bool(*v);
            }
            Value::Time(v) => {
                self.append_key(attr.key());
                self.append_time(*v)?;
            }
        }
        Ok(())
    }

    fn open_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending);
        for name in pending.drain(..) {
            self.open_group(name);
            self.opened += 1;
        }
        self.pending = pending;
    }

    fn append_quoted(&mut self, s: &str) {
        self.buf.push(b'"');
        append_escaped_str(&mut self.buf, s);
        self.buf.push(b'"');
    }

    fn append_text(&mut self, s: &str) {
        if needs_quoting(s) {
            self.append_quoted(s);
        } else {
            self.buf.extend_from_slice(s.as_bytes());
        }
    }
}

/// Whether a text-mode key or value must be quoted to stay one token.
fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(|c| {
            c == '=' || c == '"' || c == '\u{fffd}' || c.is_whitespace() || c.is_control()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferPool;
    use std::sync::Arc;
    use time::macros::datetime;

    fn state(format: Format) -> EncodeState<'static> {
        EncodeState::new(Arc::new(BufferPool::new()).acquire(), format)
    }

    fn text(state: &EncodeState<'_>) -> String {
        String::from_utf8(state.bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_separator_written_between_keys() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_key("a");
        s.append_int(1);
        s.append_key("b");
        s.append_bool(false);
        s.append_key("c");
        s.append_string("x\"y");
        s.close_object();
        assert_eq!(text(&s), "{\"a\":1,\"b\":false,\"c\":\"x\\\"y\"}\n");
    }

    #[test]
    fn test_numbers() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_key("neg");
        s.append_int(-42);
        s.append_key("big");
        s.append_uint(u64::MAX);
        s.append_key("f");
        s.append_float(1.5);
        s.append_key("nan");
        s.append_float(f64::NAN);
        s.append_key("inf");
        s.append_float(f64::NEG_INFINITY);
        s.close_object();
        assert_eq!(
            text(&s),
            "{\"neg\":-42,\"big\":18446744073709551615,\"f\":1.5,\"nan\":\"NaN\",\"inf\":\"-Inf\"}\n"
        );
    }

    #[test]
    fn test_time_format_utc_uses_numeric_offset() {
        let mut s = state(Format::Json);
        s.append_time(datetime!(2024-01-15 10:30:00.123456 UTC)).unwrap();
        assert_eq!(text(&s), "\"2024-01-15T10:30:00.123+00:00\"");
    }

    #[test]
    fn test_time_format_keeps_offset_and_pads_millis() {
        let mut s = state(Format::Json);
        s.append_time(datetime!(2023-07-04 09:05:03.5 -5:30)).unwrap();
        assert_eq!(text(&s), "\"2023-07-04T09:05:03.500-05:30\"");

        let mut s = state(Format::Json);
        s.append_time(datetime!(2023-07-04 09:05:03 +2)).unwrap();
        assert_eq!(text(&s), "\"2023-07-04T09:05:03.000+02:00\"");
    }

    #[test]
    fn test_explicit_groups_nest_and_restore_separator() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_key("a");
        s.append_int(1);
        s.open_group("g");
        s.append_key("b");
        s.append_int(2);
        s.append_key("c");
        s.append_int(3);
        s.close_group();
        s.append_key("d");
        s.append_int(4);
        s.close_object();
        assert_eq!(text(&s), "{\"a\":1,\"g\":{\"b\":2,\"c\":3},\"d\":4}\n");
    }

    #[test]
    fn test_pending_groups_open_lazily() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_key("m");
        s.append_string("x");
        s.begin_group("outer");
        s.begin_group("inner");
        s.append_attr(&Attr::int("n", 1)).unwrap();
        s.end_groups();
        s.close_object();
        assert_eq!(text(&s), "{\"m\":\"x\",\"outer\":{\"inner\":{\"n\":1}}}\n");
    }

    #[test]
    fn test_pending_groups_without_attrs_emit_nothing() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_key("m");
        s.append_string("x");
        s.begin_group("empty");
        s.append_attr(&Attr::string("", "omitted")).unwrap();
        s.end_groups();
        s.close_object();
        assert_eq!(text(&s), "{\"m\":\"x\"}\n");
    }

    #[test]
    fn test_group_attr_values() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_attr(&Attr::group(
            "req",
            vec![Attr::string("method", "GET"), Attr::int("status", 200)],
        ))
        .unwrap();
        s.append_attr(&Attr::group("", vec![Attr::bool("inlined", true)]))
            .unwrap();
        s.append_attr(&Attr::group("skipped", vec![])).unwrap();
        s.close_object();
        assert_eq!(
            text(&s),
            "{\"req\":{\"method\":\"GET\",\"status\":200},\"inlined\":true}\n"
        );
    }

    #[test]
    fn test_time_attr_value() {
        let mut s = state(Format::Json);
        s.open_object();
        s.append_attr(&Attr::time("at", datetime!(2020-02-29 23:59:59.999 UTC)))
            .unwrap();
        s.close_object();
        assert_eq!(text(&s), "{\"at\":\"2020-02-29T23:59:59.999+00:00\"}\n");
    }

    #[test]
    fn test_text_mode_pairs_and_quoting() {
        let mut s = state(Format::Text);
        s.open_object();
        s.append_key("level");
        s.append_string("INFO");
        s.append_key("message");
        s.append_string("hello world");
        s.append_attr(&Attr::string("empty", "")).unwrap();
        s.append_attr(&Attr::string("eq", "a=b")).unwrap();
        s.append_attr(&Attr::int("n", 7)).unwrap();
        s.close_object();
        assert_eq!(
            text(&s),
            "level=INFO message=\"hello world\" empty=\"\" eq=\"a=b\" n=7\n"
        );
    }

    #[test]
    fn test_text_mode_groups_use_dotted_prefix() {
        let mut s = state(Format::Text);
        s.open_object();
        s.append_key("message");
        s.append_string("m");
        s.begin_group("outer");
        s.append_attr(&Attr::int("a", 1)).unwrap();
        s.append_attr(&Attr::group("inner", vec![Attr::bool("b", true)]))
            .unwrap();
        s.append_attr(&Attr::int("c", 3)).unwrap();
        s.end_groups();
        s.append_key("after");
        s.append_int(4);
        s.close_object();
        assert_eq!(
            text(&s),
            "message=m outer.a=1 outer.inner.b=true outer.c=3 after=4\n"
        );
    }

    #[test]
    fn test_text_mode_time_is_unquoted() {
        let mut s = state(Format::Text);
        s.append_attr(&Attr::time("at", datetime!(2024-01-15 10:30:00 UTC)))
            .unwrap();
        assert_eq!(text(&s), "at=2024-01-15T10:30:00.000+00:00");
    }
}
