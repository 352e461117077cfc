//! Recursive DAG-CBOR value decoding
//!
//! One call to [`decode_value`] consumes exactly one complete value and
//! everything nested inside it. The profile is the strict DAG-CBOR subset:
//! definite lengths only, text-string map keys in canonical order, and tag
//! 42 as the single recognized tag (a CID link).

use std::collections::BTreeMap;

use crate::cbor::head::{read_head, Atom, MajorType};
use crate::cid;
use crate::cursor::Cursor;
use crate::{Error, Result};

/// Nesting is attacker-controlled; bail out long before the call stack does.
const MAX_DEPTH: usize = 128;

/// A decoded DAG-CBOR value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Negative(i64),
    Bytes(Vec<u8>),
    Text(String),
    Bool(bool),
    Null,
    Float(f64),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A CID link (tag 42), in canonical text form
    Link(String),
}

impl Value {
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&str> {
        match self {
            Value::Link(cid) => Some(cid),
            _ => None,
        }
    }

    /// Look up a map entry; `None` for missing keys and non-map values
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Render for display. Bytes become `{"$bytes": hex}` and links become
    /// `{"$link": cid}` so the output stays plain JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Unsigned(n) => serde_json::json!(n),
            Value::Negative(n) => serde_json::json!(n),
            Value::Bytes(bytes) => serde_json::json!({ "$bytes": hex::encode(bytes) }),
            Value::Text(s) => serde_json::json!(s),
            Value::Bool(b) => serde_json::json!(b),
            Value::Null => serde_json::Value::Null,
            Value::Float(f) => serde_json::json!(f),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Link(cid) => serde_json::json!({ "$link": cid }),
        }
    }
}

/// Decode one complete value from the cursor
pub fn decode_value(cursor: &mut Cursor<'_>) -> Result<Value> {
    decode_at_depth(cursor, 0)
}

fn decode_at_depth(cursor: &mut Cursor<'_>, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimit);
    }

    let (major, atom) = read_head(cursor)?;
    match (major, atom) {
        (MajorType::UnsignedInt, Atom::Uint(n)) => Ok(Value::Unsigned(n)),
        // Small negative arguments come back as their raw additional info
        (MajorType::NegativeInt, Atom::Uint(n)) => Ok(Value::Negative(-1 - n as i64)),
        (MajorType::NegativeInt, Atom::Int(n)) => Ok(Value::Negative(n)),
        (MajorType::Simple, Atom::Bool(b)) => Ok(Value::Bool(b)),
        (MajorType::Simple, Atom::Null) => Ok(Value::Null),
        (MajorType::Simple, Atom::Float(f)) => Ok(Value::Float(f)),

        (MajorType::ByteString, Atom::Uint(len)) => {
            let bytes = read_length_checked(cursor, len)?;
            Ok(Value::Bytes(bytes.to_vec()))
        }
        (MajorType::TextString, Atom::Uint(len)) => {
            let bytes = read_length_checked(cursor, len)?;
            Ok(Value::Text(String::from_utf8(bytes.to_vec())?))
        }

        (MajorType::Array, Atom::Uint(count)) => {
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(decode_at_depth(cursor, depth + 1)?);
            }
            Ok(Value::Array(items))
        }

        (MajorType::Map, Atom::Uint(count)) => {
            let mut map = BTreeMap::new();
            let mut prev_key: Option<String> = None;
            for _ in 0..count {
                let key = match decode_at_depth(cursor, depth + 1)? {
                    Value::Text(key) => key,
                    _ => return Err(Error::NonStringMapKey),
                };
                // Canonical order: ascending by byte length, then bytewise.
                // Strictness also rules out duplicate keys.
                if let Some(prev) = &prev_key {
                    let prev_rank = (prev.len(), prev.as_bytes());
                    let rank = (key.len(), key.as_bytes());
                    if prev_rank >= rank {
                        return Err(Error::Malformed(format!(
                            "map key {key:?} out of canonical order"
                        )));
                    }
                }
                let value = decode_at_depth(cursor, depth + 1)?;
                prev_key = Some(key.clone());
                map.insert(key, value);
            }
            Ok(Value::Map(map))
        }

        (MajorType::Tag, Atom::Uint(tag)) => {
            if tag != 42 {
                return Err(Error::UnsupportedTag(tag));
            }
            let inner = decode_at_depth(cursor, depth + 1)?;
            let bytes = inner
                .as_bytes()
                .ok_or_else(|| Error::Malformed("tag 42 payload must be a byte string".into()))?;
            Ok(Value::Link(cid::from_link_bytes(bytes)?))
        }

        _ => Err(Error::Malformed("not well-formed".into())),
    }
}

fn read_length_checked<'a>(cursor: &mut Cursor<'a>, len: u64) -> Result<&'a [u8]> {
    let len = usize::try_from(len)
        .map_err(|_| Error::Malformed(format!("declared length {len} overflows")))?;
    cursor.read_exact(len)
}
