//! The json capability the parser is written against.
//!
//! Every model type is parsed from a [JsonNode], never from a concrete json
//! library. An adapter for [serde_json::Value] is provided and used by default,
//! other backends only need to implement this trait to be usable with
//! [Tileson](crate::Tileson).

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Read-only view on a parsed json tree.
pub trait JsonNode: Sized {
    /// Parse a complete document from memory.
    fn parse_bytes(data: &[u8]) -> Result<Self>;

    /// Parse a complete document from a file on disk.
    fn parse_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse_bytes(&data)
    }

    /// Member of an object node. None for missing keys and non-objects.
    fn field(&self, key: &str) -> Option<&Self>;

    /// Element of an array node.
    fn at(&self, index: usize) -> Option<&Self>;

    /// All elements of an array node, empty for anything else.
    fn items(&self) -> Vec<&Self>;

    /// All keys of an object node, empty for anything else.
    fn keys(&self) -> Vec<&str>;

    /// Number of elements of an array or members of an object.
    fn size(&self) -> usize;

    fn is_array(&self) -> bool;
    fn is_object(&self) -> bool;
    fn is_null(&self) -> bool;

    fn text(&self) -> Option<&str>;
    fn int(&self) -> Option<i64>;
    fn uint(&self) -> Option<u64>;
    fn float(&self) -> Option<f64>;
    fn boolean(&self) -> Option<bool>;

    /// How often `key` occurs in this object, which is either 0 or 1.
    fn count(&self, key: &str) -> usize {
        usize::from(self.field(key).is_some())
    }

    /// Extract this node as `T`.
    fn value<T: FromJson>(&self) -> Option<T> {
        T::from_json(self)
    }
}

/// Types that can be extracted from a single json node.
pub trait FromJson: Sized {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self>;
}

impl FromJson for String {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.text().map(String::from)
    }
}

impl FromJson for PathBuf {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.text().map(PathBuf::from)
    }
}

impl FromJson for bool {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.boolean()
    }
}

impl FromJson for i64 {
    // Tiled writes some integral values (e.g. object positions) as floats
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.int().or_else(|| node.float().map(|f| f as i64))
    }
}

impl FromJson for i32 {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        i64::from_json(node).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromJson for u32 {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.uint()
            .or_else(|| node.float().filter(|f| *f >= 0.).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok())
    }
}

impl FromJson for f64 {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.float()
    }
}

impl FromJson for f32 {
    fn from_json<J: JsonNode>(node: &J) -> Option<Self> {
        node.float().map(|f| f as f32)
    }
}

/// Read an optional field.
pub(crate) fn field<T: FromJson, J: JsonNode>(json: &J, name: &str) -> Option<T> {
    json.field(name)?.value()
}

pub(crate) fn field_or<T: FromJson, J: JsonNode>(json: &J, name: &str, alternative: T) -> T {
    field(json, name).unwrap_or(alternative)
}

pub(crate) fn field_or_default<T: FromJson + Default, J: JsonNode>(json: &J, name: &str) -> T {
    field(json, name).unwrap_or_default()
}

/// Read a field that has to exist. `tag` names the parsed element for the error message.
pub(crate) fn required<T: FromJson, J: JsonNode>(json: &J, tag: &str, name: &str) -> Result<T> {
    match json.field(name) {
        None => Err(Error::missing(tag, name)),
        Some(node) => node.value().ok_or_else(|| Error::StructureError{
            tag: tag.into(),
            msg: format!("Field '{}' has an unexpected type", name),
        }),
    }
}

/// Read a string field and parse it with [FromStr](std::str::FromStr).
/// Missing fields give the default, invalid ones are logged and give the default too.
pub(crate) fn parsed_or_default<T, J>(json: &J, name: &str) -> T
where
    T: std::str::FromStr<Err = Error> + Default,
    J: JsonNode,
{
    match json.field(name).and_then(JsonNode::text) {
        None => T::default(),
        Some(text) => text.parse().unwrap_or_else(|e| {
            tracing::warn!("Ignoring field '{}': {}", name, e);
            T::default()
        }),
    }
}

/// Elements of an array field, empty if the field is missing or no array.
pub(crate) fn array<'a, J: JsonNode>(json: &'a J, name: &str) -> Vec<&'a J> {
    match json.field(name) {
        Some(node) if node.is_array() => node.items(),
        _ => Vec::new(),
    }
}

impl JsonNode for serde_json::Value {
    fn parse_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    fn field(&self, key: &str) -> Option<&Self> {
        self.as_object()?.get(key)
    }

    fn at(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn items(&self) -> Vec<&Self> {
        self.as_array().map(|a| a.iter().collect()).unwrap_or_default()
    }

    fn keys(&self) -> Vec<&str> {
        self.as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn size(&self) -> usize {
        match self {
            serde_json::Value::Array(a) => a.len(),
            serde_json::Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    fn is_array(&self) -> bool { serde_json::Value::is_array(self) }
    fn is_object(&self) -> bool { serde_json::Value::is_object(self) }
    fn is_null(&self) -> bool { serde_json::Value::is_null(self) }

    fn text(&self) -> Option<&str> { self.as_str() }
    fn int(&self) -> Option<i64> { self.as_i64() }
    fn uint(&self) -> Option<u64> { self.as_u64() }
    fn float(&self) -> Option<f64> { self.as_f64() }
    fn boolean(&self) -> Option<bool> { self.as_bool() }
}
