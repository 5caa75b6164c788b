use serde::ser::{Serialize, SerializeMap, Serializer};

/// One parsed access log line: every field of the grammar, in grammar order.
///
/// Only [`LogLineParser`](super::LogLineParser) builds records, which is what
/// keeps the field set complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLogRecord {
    fields: Vec<(&'static str, String)>,
}

impl ParsedLogRecord {
    pub(crate) fn from_fields(fields: Vec<(&'static str, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }

    /// Compact JSON object with keys in grammar order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for ParsedLogRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
