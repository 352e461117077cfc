//! # atcar
//!
//! A decoder for AT Protocol CAR repository archives.
//!
//! atcar parses the content-addressed container format used to export
//! atproto repositories: a varint-framed header, a sequence of SHA-256
//! verified DAG-CBOR blocks, and a Merkle Search Tree carrying the record
//! set. Decoding is strict — malformed, non-canonical or tampered input is
//! a hard error, never a degraded result.
//!
//! ## Example
//!
//! ```ignore
//! use atcar::{mst, Container};
//!
//! let data = std::fs::read("repo.car")?;
//! let container = Container::parse(&data)?;
//! let records = mst::records_from_root(&container.blocks, &container.root)?;
//! for (key, cid) in &records {
//!     println!("{} -> {}", String::from_utf8_lossy(key), cid);
//! }
//! ```

pub mod car;
pub mod cbor;
pub mod cid;
pub mod cursor;
pub mod mst;
pub mod resolve;
pub mod util;
pub mod varint;

mod error;

pub use car::{Container, CAR_VERSION};
pub use cbor::{decode_value, MajorType, Value};
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use mst::{enumerate_records, records_from_root, Records};
#[cfg(feature = "resolve")]
pub use resolve::HttpResolver;
pub use resolve::{profile_url_from_uri, HandleResolver, DEFAULT_SERVICE_URL};
pub use util::dedupe_case_insensitive;
pub use varint::read_varint;
