//! Opaque records returned by the API.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A ticket, alert or catalog entry as returned by the server.
///
/// The API's field set is not guaranteed, so a record is kept as a plain
/// JSON object. [`id`](Self::id) and [`subject`](Self::subject) cover the
/// fields nearly every collection carries; anything else is reachable
/// through [`get`](Self::get) or by dereferencing to the underlying map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an existing JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Numeric identifier, if present.
    ///
    /// Some endpoints send ids as strings, so numeric strings are accepted.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        match self.0.get("id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Subject line, falling back to `summary`, `title` and `name`.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        ["subject", "summary", "title", "name"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }

    /// Look up a raw field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Unwrap into the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Deref for Record {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}
