//! Attributes and records handed to a [`Handler`](crate::Handler).

use time::OffsetDateTime;

use crate::Level;

/// The typed value of an [`Attr`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(OffsetDateTime),
    /// A nested set of attributes, emitted as a sub-object.
    Group(Vec<Attr>),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Value::Time(v)
    }
}

/// A key paired with a typed value.
///
/// An attribute whose key is empty is omitted from the output, unless it holds
/// a group, in which case the group's members are inlined into the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    key: String,
    value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, Value::Uint(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn time(key: impl Into<String>, value: OffsetDateTime) -> Self {
        Self::new(key, Value::Time(value))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self::new(key, Value::Group(attrs))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether encoding this attribute produces no output at all.
    pub fn is_omitted(&self) -> bool {
        match &self.value {
            Value::Group(attrs) => attrs.iter().all(Attr::is_omitted),
            _ => self.key.is_empty(),
        }
    }
}

/// A single log event.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    level: Level,
    message: String,
    time: Option<OffsetDateTime>,
    attrs: Vec<Attr>,
}

impl Record {
    /// Create a record without a timestamp or attributes.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            time: None,
            attrs: Vec::new(),
        }
    }

    /// Stamp the record.
    pub fn with_time(mut self, time: OffsetDateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Append a call-site attribute.
    pub fn with_attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    /// Append several call-site attributes.
    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn time(&self) -> Option<OffsetDateTime> {
        self.time
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_omitted_rules() {
        assert!(Attr::string("", "x").is_omitted());
        assert!(!Attr::string("k", "").is_omitted());
        assert!(Attr::group("g", vec![]).is_omitted());
        assert!(Attr::group("g", vec![Attr::int("", 1)]).is_omitted());
        assert!(!Attr::group("", vec![Attr::int("n", 1)]).is_omitted());
        assert!(
            Attr::group("outer", vec![Attr::group("inner", vec![])]).is_omitted(),
            "nested empty groups are omitted"
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Attr::new("a", "s").value(), &Value::String("s".to_string()));
        assert_eq!(Attr::new("a", 3i32).value(), &Value::Int(3));
        assert_eq!(Attr::new("a", 3u32).value(), &Value::Uint(3));
        assert_eq!(Attr::new("a", true).value(), &Value::Bool(true));
        assert_eq!(Attr::new("a", 1.5).value(), &Value::Float(1.5));
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new(Level::Warn, "careful")
            .with_attr(Attr::int("a", 1))
            .with_attrs([Attr::bool("b", true), Attr::string("c", "x")]);
        assert_eq!(record.level(), Level::Warn);
        assert_eq!(record.message(), "careful");
        assert!(record.time().is_none());
        let keys: Vec<_> = record.attrs().iter().map(Attr::key).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
