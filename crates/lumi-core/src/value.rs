//! Raw attribute values and the normalized payload.
//!
//! An attribute report is a map from numeric attribute index to a scalar
//! (or, for a few vendor attributes, a nested byte buffer, list or map).
//! The semantic layer turns such a map into a `NormalizedPayload`: a flat
//! JSON object keyed by canonical property name.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Custom serialization module for binary data as base64
mod bytes_serde {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Mapping from attribute index to raw value.
///
/// `BTreeMap` keeps iteration in index order, which keeps the diagnostic
/// logs stable across runs.
pub type AttributeMap = BTreeMap<u16, AttrValue>;

/// The flat property map handed to the publish pipeline.
pub type NormalizedPayload = serde_json::Map<String, serde_json::Value>;

/// A raw attribute value as delivered by the transport or decoded from a
/// vendor struct buffer.
///
/// 64-bit values keep their own variants so device counters never lose
/// precision on the way through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
    /// Binary data serialized as base64 string
    #[serde(with = "bytes_serde")]
    Bytes(Vec<u8>),
    /// Structured list values (e.g. the 0xFF02 element array)
    List(Vec<AttrValue>),
    /// Nested attribute map (e.g. the pre-parsed 0xFF01 report)
    Map(AttributeMap),
}

impl AttrValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::U64(v) => Some(*v as f64),
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            Self::Bool(v) => Some(u8::from(*v) as f64),
            _ => None,
        }
    }

    /// Integer view of the value, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::I64(v) => Some(*v),
            Self::F64(v) => Some(*v as i64),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::F64(_) => "f64",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Lossless conversion into a JSON value for the normalized payload.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::U64(v) => serde_json::Value::from(*v),
            Self::I64(v) => serde_json::Value::from(*v),
            Self::F64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(v) => serde_json::Value::from(*v),
            Self::Str(v) => serde_json::Value::from(v.clone()),
            Self::Bytes(v) => serde_json::Value::from(hex::encode(v)),
            Self::List(v) => serde_json::Value::from(
                v.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            ),
            Self::Map(v) => serde_json::Value::Object(
                v.iter()
                    .map(|(k, e)| (k.to_string(), e.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}
