//! Quest Metadata Encoding
//!
//! Key/value payload consumed verbatim by the client. Entries are written as
//! `KEY:TYPE:VALUE;` in insertion order, where TYPE is `b` (bool), `2`
//! (short), `4` (int) or `s` (string).

use std::fmt;

/// A single typed metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Bool(bool),
    Short(i16),
    Int(i32),
    String(String),
}

impl MetaValue {
    fn type_code(&self) -> &'static str {
        match self {
            MetaValue::Bool(_) => "b",
            MetaValue::Short(_) => "2",
            MetaValue::Int(_) => "4",
            MetaValue::String(_) => "s",
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(v) => write!(f, "{}", if *v { 1 } else { 0 }),
            MetaValue::Short(v) => write!(f, "{}", v),
            MetaValue::Int(v) => write!(f, "{}", v),
            MetaValue::String(v) => f.write_str(&escape(v)),
        }
    }
}

/// Separators inside string values would split the entry
fn escape(value: &str) -> String {
    value.replace(':', "%C").replace(';', "%S")
}

/// Ordered metadata dictionary. Setting an existing key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    entries: Vec<(String, MetaValue)>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, key: &str, value: MetaValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, MetaValue::Bool(value));
    }

    pub fn set_short(&mut self, key: &str, value: i16) {
        self.set(key, MetaValue::Short(value));
    }

    pub fn set_int(&mut self, key: &str, value: i32) {
        self.set(key, MetaValue::Int(value));
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, MetaValue::String(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(MetaValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the payload handed to the client protocol
    pub fn to_payload(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            write!(f, "{}:{}:{};", key, value.type_code(), value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_format() {
        let mut meta = MetaData::new();
        meta.set_string("TGTSID", "wolf|fox");
        meta.set_int("TARGETCOUNT", 3);
        meta.set_short("TGTCLS", 0);
        meta.set_bool("QO_FLAG", true);

        assert_eq!(
            meta.to_payload(),
            "TGTSID:s:wolf|fox;TARGETCOUNT:4:3;TGTCLS:2:0;QO_FLAG:b:1;"
        );
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut meta = MetaData::new();
        meta.set_int("A", 1);
        meta.set_int("B", 2);
        meta.set_int("A", 5);

        assert_eq!(meta.to_payload(), "A:4:5;B:4:2;");
        assert_eq!(meta.get("A"), Some(&MetaValue::Int(5)));
    }

    #[test]
    fn test_string_values_are_escaped() {
        let mut meta = MetaData::new();
        meta.set_string("QSTTIP", "N_a:b;c");

        assert_eq!(meta.to_payload(), "QSTTIP:s:N_a%Cb%Sc;");
        // Stored value stays raw
        assert_eq!(meta.get_string("QSTTIP"), Some("N_a:b;c"));
    }
}
