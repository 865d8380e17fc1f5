use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key holding a layer's display name.
pub const LAYER_NAME_KEY: &str = "layer_name";

/// Reserved key holding a layer's identifier.
pub const LAYER_ID_KEY: &str = "layer_id";

/// One overlay of printer settings (user edits, a material or quality
/// preset, the printer base, the OEM layer).
///
/// Wraps the raw JSON `Map<String, Value>` so unknown settings survive a
/// load/save cycle untouched and in file order. Values are always strings;
/// numbers and booleans read from disk are stored as their text. The
/// layer's name and id are stored as ordinary entries under
/// [`LAYER_NAME_KEY`] and [`LAYER_ID_KEY`], matching the on-disk profile
/// format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct SettingsLayer {
    values: Map<String, Value>,
}

impl SettingsLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty layer carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        let mut layer = Self::new();
        layer.set_name(name);
        layer
    }

    // --- Identity ---

    pub fn name(&self) -> Option<&str> {
        self.get(LAYER_NAME_KEY)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set(LAYER_NAME_KEY, name);
    }

    pub fn id(&self) -> Option<&str> {
        self.get(LAYER_ID_KEY)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set(LAYER_ID_KEY, id);
    }

    // --- Values ---

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert or replace a value, returning the previous one. A replaced
    /// key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values
            .insert(key.into(), Value::String(value.into()))
            .and_then(into_text)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.shift_remove(key).and_then(into_text)
    }

    /// Entries in insertion (file) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SettingsLayer
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }
}

impl From<Map<String, Value>> for SettingsLayer {
    fn from(map: Map<String, Value>) -> Self {
        let values = map
            .into_iter()
            .filter_map(|(key, value)| into_text(value).map(|text| (key, Value::String(text))))
            .collect();
        Self { values }
    }
}

impl From<SettingsLayer> for Map<String, Value> {
    fn from(layer: SettingsLayer) -> Self {
        layer.values
    }
}

/// Text form of a scalar JSON value. Arrays, objects and null have none.
fn into_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if b { "1" } else { "0" }.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
