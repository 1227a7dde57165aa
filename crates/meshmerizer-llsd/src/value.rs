//! The LLSD value model.

use std::collections::BTreeMap;

/// An LLSD map. Keys are kept sorted so serialization is deterministic.
pub type Map = BTreeMap<String, Value>;

/// A decoded LLSD value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
    Uuid([u8; 16]),
    /// Seconds since the Unix epoch.
    Date(f64),
    Uri(String),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Look up `key` if this value is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Binary payload. Strings are accepted as their UTF-8 bytes.
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Loose boolean conversion.
    ///
    /// Integers and reals are true when non-zero; strings are true when they
    /// read `"1"` or `"true"`. Anything else is false.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Real(r) => *r != 0.0,
            Self::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Loose integer conversion. Reals are truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Real(r) if r.is_finite() => Some(*r as i32),
            Self::Boolean(b) => Some(i32::from(*b)),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Loose real conversion.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            Self::Integer(i) => Some(f64::from(*i)),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret an array of at least three numbers as a 3-vector.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        let items = self.as_array()?;
        if items.len() < 3 {
            return None;
        }
        Some([
            items[0].as_real()? as f32,
            items[1].as_real()? as f32,
            items[2].as_real()? as f32,
        ])
    }

    /// Build a 3-element real array.
    #[must_use]
    pub fn vec3(v: [f32; 3]) -> Self {
        Self::Array(v.iter().map(|c| Self::Real(f64::from(*c))).collect())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}
