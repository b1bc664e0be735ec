use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level fields every resource description is expected to carry.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "label",
    "externalIdentifier",
    "version",
    "type",
    "access",
    "administrative",
    "identification",
    "structural",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("resource identifier must not be empty")]
    Empty,
}

/// Opaque key addressing one object in the upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceIdentifier(String);

impl ResourceIdentifier {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceIdentifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceIdentifier> for String {
    fn from(value: ResourceIdentifier) -> Self {
        value.0
    }
}

impl AsRef<str> for ResourceIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resource description as served by the upstream object service.
///
/// The wrapped object is never modified; the accessors only read from it, so
/// serializing a document yields exactly what the upstream sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceDocument(Map<String, Value>);

impl ResourceDocument {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parses raw bytes, requiring a JSON object at the top level.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn label(&self) -> Option<&str> {
        self.0.get("label").and_then(Value::as_str)
    }

    pub fn external_identifier(&self) -> Option<&str> {
        self.0.get("externalIdentifier").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<u64> {
        self.0
            .get("version")
            .and_then(Value::as_u64)
            .filter(|version| *version > 0)
    }

    /// The content model URI, stored under `type`.
    pub fn content_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn access(&self) -> Option<&Map<String, Value>> {
        self.object("access")
    }

    pub fn administrative(&self) -> Option<&Map<String, Value>> {
        self.object("administrative")
    }

    pub fn identification(&self) -> Option<&Map<String, Value>> {
        self.object("identification")
    }

    pub fn structural(&self) -> Option<&Map<String, Value>> {
        self.object("structural")
    }

    /// Nested descriptions under `structural.contains`. Entries that are not
    /// objects are skipped.
    pub fn contains(&self) -> Vec<ResourceDocument> {
        self.structural()
            .and_then(|structural| structural.get("contains"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .cloned()
                    .map(ResourceDocument)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.0.contains_key(*field))
            .collect()
    }

    fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }
}
