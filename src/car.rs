//! CAR container parsing
//!
//! A container is a varint-framed header followed by a sequence of
//! varint-framed blocks, each a 36-byte binary CID plus a DAG-CBOR payload.
//! Every block's payload is hashed and checked against the digest its CID
//! claims, so a fully parsed container is verified content all the way down.
//! Any framing, integrity or structure failure aborts the whole parse; there
//! is no partial result.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::cbor::{decode_value, Value};
use crate::cid;
use crate::cursor::Cursor;
use crate::varint::read_varint;
use crate::{Error, Result};

/// The only supported container format version
pub const CAR_VERSION: u64 = 1;

/// A fully parsed, hash-verified container
#[derive(Debug)]
pub struct Container {
    /// CID of the single root block
    pub root: String,
    /// Every block in the archive, keyed by CID text
    pub blocks: HashMap<String, Value>,
}

impl Container {
    /// Parse a complete container from an in-memory buffer
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let root = parse_header(&mut cursor)?;

        let mut blocks = HashMap::new();
        while !cursor.is_empty() {
            let (cid, value) = parse_block(&mut cursor)?;
            // Identical digests imply identical payloads, so a collision
            // can only overwrite a block with itself
            blocks.insert(cid, value);
        }

        Ok(Container { root, blocks })
    }

    /// Look up a block by CID
    pub fn get(&self, cid: &str) -> Option<&Value> {
        self.blocks.get(cid)
    }

    /// The decoded root block, when the archive actually contains it
    pub fn root_block(&self) -> Option<&Value> {
        self.blocks.get(&self.root)
    }

    /// Number of blocks in the archive
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Parse the header and return the root CID.
///
/// Structure checks (version, root count) run before any block is read.
fn parse_header(cursor: &mut Cursor<'_>) -> Result<String> {
    let header_len = read_varint(cursor)?;
    let header_start = cursor.position();
    let header = decode_value(cursor)?;
    let consumed = (cursor.position() - header_start) as u64;
    if consumed != header_len {
        return Err(Error::Framing {
            context: "header",
            declared: header_len,
            actual: consumed,
        });
    }

    if header.as_map().is_none() {
        return Err(Error::Structure("header must be a map".into()));
    }

    let version = header
        .get("version")
        .and_then(Value::as_unsigned)
        .ok_or_else(|| Error::Structure("header has no version".into()))?;
    if version != CAR_VERSION {
        return Err(Error::VersionMismatch {
            expected: CAR_VERSION,
            found: version,
        });
    }

    let roots = header
        .get("roots")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Structure("header has no roots".into()))?;
    let root = match roots {
        [root] => root,
        _ => {
            return Err(Error::Structure(format!(
                "expected exactly one root, found {}",
                roots.len()
            )))
        }
    };
    root.as_link()
        .map(str::to_string)
        .ok_or_else(|| Error::Structure("root is not a CID link".into()))
}

/// Parse one length-framed, hash-verified block
fn parse_block(cursor: &mut Cursor<'_>) -> Result<(String, Value)> {
    let block_len = read_varint(cursor)?;
    let block_start = cursor.position();

    if block_len < cid::BLOCK_LEN as u64 {
        return Err(Error::Malformed(format!(
            "block length {block_len} is shorter than a CID"
        )));
    }
    let cid_raw = cursor.read_exact(cid::BLOCK_LEN)?;
    let cid = cid::from_block_bytes(cid_raw)?;

    let payload = read_length_checked(cursor, block_len - cid::BLOCK_LEN as u64)?;
    if Sha256::digest(payload).as_slice() != cid::digest(cid_raw) {
        return Err(Error::IntegrityMismatch { cid });
    }

    let mut payload_cursor = Cursor::new(payload);
    let value = decode_value(&mut payload_cursor)?;
    if !payload_cursor.is_empty() {
        return Err(Error::Framing {
            context: "block payload",
            declared: payload.len() as u64,
            actual: payload_cursor.position() as u64,
        });
    }

    let consumed = (cursor.position() - block_start) as u64;
    if consumed != block_len {
        return Err(Error::Framing {
            context: "block",
            declared: block_len,
            actual: consumed,
        });
    }

    Ok((cid, value))
}

fn read_length_checked<'a>(cursor: &mut Cursor<'a>, len: u64) -> Result<&'a [u8]> {
    let len = usize::try_from(len)
        .map_err(|_| Error::Malformed(format!("declared length {len} overflows")))?;
    cursor.read_exact(len)
}
