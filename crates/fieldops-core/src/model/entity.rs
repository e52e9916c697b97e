// ── Opaque API record ──
//
// The list controller only reads the `id`, the status field, and the
// fields named by column keys. Everything else passes through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record returned by a collection endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The row identifier. Accepts string or numeric ids.
    pub fn id(&self) -> Option<String> {
        self.0.get("id").or_else(|| self.0.get("_id")).and_then(scalar_to_string)
    }

    /// Resolve a dotted path (`customer.name`) into a field value.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Cell text for a column key. Missing and null fields render empty.
    pub fn display(&self, path: &str) -> String {
        match self.field(path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::Object(map)) => map
                .get("name")
                .or_else(|| map.get("title"))
                .and_then(scalar_to_string)
                .unwrap_or_default(),
            Some(other) => scalar_to_string(other).unwrap_or_default(),
        }
    }

    /// Lower-cased status text from `field`, if present.
    pub fn status(&self, field: &str) -> Option<String> {
        let raw = self.display(field);
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    /// Human label for dialogs: name, title, or number, falling back to the id.
    pub fn label(&self) -> String {
        ["name", "title", "number", "quote_number", "ticket_number"]
            .iter()
            .map(|key| self.display(key))
            .find(|s| !s.is_empty())
            .or_else(|| self.id())
            .unwrap_or_else(|| "(unnamed)".into())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Entity {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
