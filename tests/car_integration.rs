//! Container decoding integration tests
//!
//! These tests hand-encode synthetic CAR archives (canonical DAG-CBOR,
//! varint framing, real SHA-256 CIDs) and run them through the full decode
//! path: container parse, block verification, and record enumeration.

use sha2::{Digest, Sha256};

use atcar::{cid, mst, Container, Error, Value};

// ============================================================================
// Encoding helpers (encoder-as-oracle for the decoder under test)
// ============================================================================

fn varint(mut n: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Minimal-form CBOR head for `major` with argument `arg`
fn head(major: u8, arg: u64) -> Vec<u8> {
    let mut out = Vec::new();
    if arg < 24 {
        out.push(major << 5 | arg as u8);
    } else if arg <= u64::from(u8::MAX) {
        out.push(major << 5 | 24);
        out.push(arg as u8);
    } else if arg <= u64::from(u16::MAX) {
        out.push(major << 5 | 25);
        out.extend((arg as u16).to_be_bytes());
    } else if arg <= u64::from(u32::MAX) {
        out.push(major << 5 | 26);
        out.extend((arg as u32).to_be_bytes());
    } else {
        out.push(major << 5 | 27);
        out.extend(arg.to_be_bytes());
    }
    out
}

fn uint(n: u64) -> Vec<u8> {
    head(0, n)
}

fn bytes(data: &[u8]) -> Vec<u8> {
    let mut out = head(2, data.len() as u64);
    out.extend_from_slice(data);
    out
}

fn text(s: &str) -> Vec<u8> {
    let mut out = head(3, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
    out
}

fn null() -> Vec<u8> {
    vec![0xf6]
}

/// A map from pre-encoded (key, value) pairs; keys must already be in
/// canonical order
fn map(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut out = head(5, entries.len() as u64);
    for (key, value) in entries {
        out.extend(text(key));
        out.extend_from_slice(value);
    }
    out
}

fn array(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = head(4, items.len() as u64);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Tag-42 link over the 37-byte identity-multibase layout
fn link(cid_raw: &[u8; 36]) -> Vec<u8> {
    let mut out = head(6, 42);
    let mut payload = vec![0x00];
    payload.extend_from_slice(cid_raw);
    out.extend(bytes(&payload));
    out
}

/// Binary block CID for a dag-cbor payload
fn cid_raw_for(payload: &[u8]) -> [u8; 36] {
    let mut raw = [0u8; 36];
    raw[..4].copy_from_slice(&[0x01, 0x71, 0x12, 0x20]);
    raw[4..].copy_from_slice(&Sha256::digest(payload));
    raw
}

fn cid_text_for(payload: &[u8]) -> String {
    cid::from_block_bytes(&cid_raw_for(payload)).unwrap()
}

/// Length-framed block: varint(36 + payload len) + raw CID + payload
fn block(payload: &[u8]) -> Vec<u8> {
    let cid_raw = cid_raw_for(payload);
    let mut out = varint(36 + payload.len() as u64);
    out.extend_from_slice(&cid_raw);
    out.extend_from_slice(payload);
    out
}

/// Header `{roots: [root], version: 1}` followed by the given blocks
fn car(root_cid_raw: &[u8; 36], blocks: &[Vec<u8>]) -> Vec<u8> {
    let header = map(&[
        ("roots", array(&[link(root_cid_raw)])),
        ("version", uint(1)),
    ]);
    let mut out = varint(header.len() as u64);
    out.extend_from_slice(&header);
    for b in blocks {
        out.extend_from_slice(b);
    }
    out
}

/// A two-record repository: commit -> MST node -> two posts sharing a key
/// prefix. Returns (archive bytes, expected key/record pairs).
fn sample_repo() -> (Vec<u8>, Vec<(&'static str, Vec<u8>)>) {
    let record_a = map(&[("text", text("first post"))]);
    let record_b = map(&[("text", text("second post"))]);

    let key_a = "app.bsky.feed.post/3k44abc";
    let key_b = "app.bsky.feed.post/3k44def";
    // the keys share their first 23 bytes
    let node = map(&[
        (
            "e",
            array(&[
                map(&[
                    ("k", bytes(key_a.as_bytes())),
                    ("p", uint(0)),
                    ("t", null()),
                    ("v", link(&cid_raw_for(&record_a))),
                ]),
                map(&[
                    ("k", bytes(b"def")),
                    ("p", uint(23)),
                    ("t", null()),
                    ("v", link(&cid_raw_for(&record_b))),
                ]),
            ]),
        ),
        ("l", null()),
    ]);

    let commit = map(&[
        ("did", text("did:plc:ewvi7nxzyoun6zhxrhs64oiz")),
        ("rev", text("3k44deefqdk2g")),
        ("sig", bytes(&[0xab; 64])),
        ("data", link(&cid_raw_for(&node))),
        ("prev", null()),
        ("version", uint(3)),
    ]);

    let archive = car(
        &cid_raw_for(&commit),
        &[block(&commit), block(&node), block(&record_a), block(&record_b)],
    );
    (archive, vec![(key_a, record_a), (key_b, record_b)])
}

// ============================================================================
// Full decode path
// ============================================================================

#[test]
fn test_parse_sample_repo() {
    let (archive, _) = sample_repo();
    let container = Container::parse(&archive).unwrap();

    assert_eq!(container.len(), 4);
    let root = container.root_block().expect("root block present");
    assert_eq!(
        root.get("did").and_then(Value::as_text),
        Some("did:plc:ewvi7nxzyoun6zhxrhs64oiz")
    );
    assert_eq!(root.get("version").and_then(Value::as_unsigned), Some(3));
    assert_eq!(root.get("prev"), Some(&Value::Null));
}

#[test]
fn test_enumerate_sample_records() {
    let (archive, expected) = sample_repo();
    let container = Container::parse(&archive).unwrap();
    let records = mst::records_from_root(&container.blocks, &container.root).unwrap();

    assert_eq!(records.len(), expected.len());
    for (key, payload) in &expected {
        let value_cid = records
            .get(key.as_bytes())
            .unwrap_or_else(|| panic!("missing record {key}"));
        assert_eq!(value_cid, &cid_text_for(payload));
        // the record itself decodes out of the block mapping
        let record = container.get(value_cid).unwrap();
        assert!(record.get("text").is_some());
    }
}

#[test]
fn test_empty_archive_has_no_blocks() {
    let missing_root = cid_raw_for(b"nothing");
    let archive = car(&missing_root, &[]);
    let container = Container::parse(&archive).unwrap();
    assert!(container.is_empty());
    assert!(container.root_block().is_none());
}

// ============================================================================
// Integrity
// ============================================================================

#[test]
fn test_corrupted_payload_is_fatal() {
    let (mut archive, _) = sample_repo();
    // flip one bit in the last payload byte
    let last = archive.len() - 1;
    archive[last] ^= 0x01;
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::IntegrityMismatch { .. })
    ));
}

#[test]
fn test_no_partial_result_on_late_corruption() {
    // Corruption in the final block must fail the whole parse even though
    // every earlier block verified
    let (mut archive, _) = sample_repo();
    let last = archive.len() - 1;
    archive[last] ^= 0x01;
    assert!(Container::parse(&archive).is_err());
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_zero_roots_rejected_before_blocks() {
    let header = map(&[("roots", array(&[])), ("version", uint(1))]);
    let mut archive = varint(header.len() as u64);
    archive.extend_from_slice(&header);
    // garbage after the header never gets read
    archive.extend_from_slice(&[0xde, 0xad]);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::Structure(_))
    ));
}

#[test]
fn test_two_roots_rejected() {
    let root = cid_raw_for(b"a");
    let header = map(&[
        ("roots", array(&[link(&root), link(&root)])),
        ("version", uint(1)),
    ]);
    let mut archive = varint(header.len() as u64);
    archive.extend_from_slice(&header);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::Structure(_))
    ));
}

#[test]
fn test_wrong_version_rejected() {
    let root = cid_raw_for(b"a");
    let header = map(&[("roots", array(&[link(&root)])), ("version", uint(2))]);
    let mut archive = varint(header.len() as u64);
    archive.extend_from_slice(&header);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::VersionMismatch {
            expected: 1,
            found: 2
        })
    ));
}

#[test]
fn test_non_map_header_rejected() {
    let header = uint(7);
    let mut archive = varint(header.len() as u64);
    archive.extend_from_slice(&header);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::Structure(_))
    ));
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn test_header_length_mismatch_rejected() {
    let root = cid_raw_for(b"a");
    let header = map(&[("roots", array(&[link(&root)])), ("version", uint(1))]);
    // declare one byte more than the header occupies
    let mut archive = varint(header.len() as u64 + 1);
    archive.extend_from_slice(&header);
    archive.push(0x00);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::Framing {
            context: "header",
            ..
        })
    ));
}

#[test]
fn test_trailing_bytes_in_block_payload_rejected() {
    // payload is a valid value plus one stray byte; the CID covers the whole
    // payload so integrity passes and framing has to catch it
    let mut payload = uint(5);
    payload.push(0x00);
    let root = cid_raw_for(&payload);
    let archive = car(&root, &[block(&payload)]);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::Framing {
            context: "block payload",
            ..
        })
    ));
}

#[test]
fn test_block_shorter_than_cid_rejected() {
    let root = cid_raw_for(b"a");
    let mut archive = car(&root, &[]);
    archive.extend(varint(10));
    archive.extend_from_slice(&[0u8; 10]);
    assert!(Container::parse(&archive).is_err());
}

#[test]
fn test_truncated_block_is_eof() {
    let (archive, _) = sample_repo();
    let truncated = &archive[..archive.len() - 8];
    assert!(matches!(
        Container::parse(truncated),
        Err(Error::UnexpectedEof { .. })
    ));
}

// ============================================================================
// Malformed encoding inside a block
// ============================================================================

#[test]
fn test_non_string_map_key_in_block_rejected() {
    // {1: 2} hashes fine but is not DAG-CBOR
    let mut payload = head(5, 1);
    payload.extend(uint(1));
    payload.extend(uint(2));
    let root = cid_raw_for(&payload);
    let archive = car(&root, &[block(&payload)]);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::NonStringMapKey)
    ));
}

#[test]
fn test_indefinite_length_in_block_rejected() {
    let payload = vec![0x9f, 0x01, 0xff]; // [_ 1]
    let root = cid_raw_for(&payload);
    let archive = car(&root, &[block(&payload)]);
    assert!(matches!(
        Container::parse(&archive),
        Err(Error::IndefiniteLength)
    ));
}

// ============================================================================
// CLI
// ============================================================================

#[test]
fn test_cli_records_on_sample_repo() {
    use std::process::Command;

    let (archive, expected) = sample_repo();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo.car");
    std::fs::write(&path, &archive).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_atcar"))
        .args(["records", path.to_str().unwrap()])
        .output()
        .expect("failed to execute atcar");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for (key, _) in &expected {
        assert!(stdout.contains(key), "missing {key} in: {stdout}");
    }
}

#[test]
fn test_cli_info_reports_root() {
    use std::process::Command;

    let (archive, _) = sample_repo();
    let container = Container::parse(&archive).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo.car");
    std::fs::write(&path, &archive).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_atcar"))
        .args(["info", path.to_str().unwrap()])
        .output()
        .expect("failed to execute atcar");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&container.root));
}

#[test]
fn test_cli_fails_on_corrupt_archive() {
    use std::process::Command;

    let (mut archive, _) = sample_repo();
    let last = archive.len() - 1;
    archive[last] ^= 0x01;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repo.car");
    std::fs::write(&path, &archive).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_atcar"))
        .args(["records", path.to_str().unwrap()])
        .output()
        .expect("failed to execute atcar");

    assert!(!output.status.success());
}
