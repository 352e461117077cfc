//! CID codec
//!
//! Content identifiers arrive in two fixed binary layouts: embedded links
//! (tag 42) carry a leading identity-multibase byte over a 36-byte body,
//! container block headers carry the 36-byte body alone. The body is
//! version marker, codec marker, hash-function marker, digest length, and a
//! 32-byte SHA-256 digest. Only CIDv1 with the DAG-CBOR or raw codec over
//! SHA-256 is accepted.
//!
//! The text form is the de facto wire format other systems parse, so it is
//! reproduced bit for bit: ASCII `b`, then lowercase RFC 4648 base32 of the
//! 36 bytes with padding stripped.

use crate::{Error, Result};

/// CIDv1, dag-cbor codec, sha2-256, 32-byte digest
const DAG_CBOR_SHA256: [u8; 4] = [0x01, 0x71, 0x12, 0x20];
/// CIDv1, raw codec, sha2-256, 32-byte digest
const RAW_SHA256: [u8; 4] = [0x01, 0x55, 0x12, 0x20];

/// Total layout length for an embedded link (multibase byte included)
pub const LINK_LEN: usize = 37;
/// Total layout length for a block CID (no multibase byte)
pub const BLOCK_LEN: usize = 36;

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Encode an embedded-link layout (37 bytes, leading identity-multibase
/// byte, dag-cbor or raw codec) to canonical text
pub fn from_link_bytes(bytes: &[u8]) -> Result<String> {
    if bytes.len() != LINK_LEN || bytes[0] != 0x00 {
        return Err(Error::UnknownCidPrefix(hex::encode(
            &bytes[..bytes.len().min(5)],
        )));
    }
    let body = &bytes[1..];
    if body[..4] != DAG_CBOR_SHA256 && body[..4] != RAW_SHA256 {
        return Err(Error::UnknownCidPrefix(hex::encode(&bytes[..5])));
    }
    Ok(encode(body))
}

/// Encode a block-CID layout (36 bytes, dag-cbor only) to canonical text
pub fn from_block_bytes(bytes: &[u8]) -> Result<String> {
    if bytes.len() != BLOCK_LEN || bytes[..4] != DAG_CBOR_SHA256 {
        return Err(Error::UnknownCidPrefix(hex::encode(
            &bytes[..bytes.len().min(4)],
        )));
    }
    Ok(encode(bytes))
}

/// The trailing 32 digest bytes of a raw CID layout
pub fn digest(bytes: &[u8]) -> &[u8] {
    &bytes[bytes.len() - 32..]
}

fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(1 + bytes.len().div_ceil(5) * 8);
    out.push('b');
    base32_lower(bytes, &mut out);
    out
}

/// Lowercase RFC 4648 base32, no padding
fn base32_lower(bytes: &[u8], out: &mut String) {
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in bytes {
        buffer = buffer << 8 | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[(buffer >> bits) as usize & 0x1f] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[(buffer << (5 - bits)) as usize & 0x1f] as char);
    }
}
