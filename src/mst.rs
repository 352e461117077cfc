//! Merkle Search Tree record enumeration
//!
//! Repository records live in an MST whose nodes are DAG-CBOR maps: an
//! optional `l` link to a left subtree, and an ordered `e` list of entries
//! carrying a shared-prefix length `p`, a key suffix `k`, a value link `v`
//! and an optional right-subtree link `t`. Keys are reconstructed by
//! prefix-delta against the previous key in the same node.
//!
//! The block mapping acts as a content-addressed arena: subtree pointers are
//! lookups by CID string, never live references, and links whose target is
//! absent from the archive are simply skipped.

use std::collections::{BTreeMap, HashMap};

use crate::cbor::Value;
use crate::{Error, Result};

/// Reconstructed record set: full key bytes to value CID
pub type Records = BTreeMap<Vec<u8>, String>;

/// Recursively enumerate every record reachable from `node`
pub fn enumerate_records(blocks: &HashMap<String, Value>, node: &Value) -> Result<Records> {
    let node = node
        .as_map()
        .ok_or_else(|| Error::Structure("tree node must be a map".into()))?;

    let mut records = Records::new();

    // Left subtree first: all of its keys sort below this node's keys
    if let Some(left) = node.get("l").and_then(Value::as_link) {
        if let Some(subtree) = blocks.get(left) {
            records.extend(enumerate_records(blocks, subtree)?);
        }
    }

    let entries = node
        .get("e")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Structure("tree node has no entry list".into()))?;

    let mut prev_key: Vec<u8> = Vec::new();
    for entry in entries {
        let prefix_len = entry
            .get("p")
            .and_then(Value::as_unsigned)
            .ok_or_else(|| Error::Structure("tree entry has no prefix length".into()))?
            as usize;
        let suffix = entry
            .get("k")
            .and_then(Value::as_bytes)
            .ok_or_else(|| Error::Structure("tree entry has no key suffix".into()))?;
        let value = entry
            .get("v")
            .and_then(Value::as_link)
            .ok_or_else(|| Error::Structure("tree entry has no value link".into()))?;

        if prefix_len > prev_key.len() {
            return Err(Error::Structure(format!(
                "shared prefix length {prefix_len} exceeds previous key length {}",
                prev_key.len()
            )));
        }

        let mut key = prev_key[..prefix_len].to_vec();
        key.extend_from_slice(suffix);
        records.insert(key.clone(), value.to_string());
        prev_key = key;

        // Right subtree holds keys between this entry and the next
        if let Some(right) = entry.get("t").and_then(Value::as_link) {
            if let Some(subtree) = blocks.get(right) {
                records.extend(enumerate_records(blocks, subtree)?);
            }
        }
    }

    Ok(records)
}

/// Enumerate records starting from the container root.
///
/// A repository root is normally a signed commit whose `data` field links to
/// the MST root; a bare tree node as the root is accepted too.
pub fn records_from_root(blocks: &HashMap<String, Value>, root: &str) -> Result<Records> {
    let root_block = blocks
        .get(root)
        .ok_or_else(|| Error::Structure(format!("root block {root} is not in the archive")))?;

    if let Some(data) = root_block.get("data").and_then(Value::as_link) {
        let tree = blocks
            .get(data)
            .ok_or_else(|| Error::Structure(format!("tree root {data} is not in the archive")))?;
        return enumerate_records(blocks, tree);
    }

    enumerate_records(blocks, root_block)
}
