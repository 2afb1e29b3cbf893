//! On-disk encodings.
//!
//! Graph file, binary:
//!
//! ```text
//! ┌────────┬──────────────┬──────────────────────────┐
//! │ "WMAP" │ version u32  │ bincode(Graph)           │
//! │ 4 B    │ 4 B, LE      │ rest of file             │
//! └────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! or pretty-printed JSON of the same `Graph`. Readers detect which one
//! they were given. Snapshot files are plain bincode of the snapshot record.

use crate::StorageError;
use serde::{Deserialize, Serialize};
use waymap_model::{Graph, Snapshot};

pub const GRAPH_MAGIC: &[u8; 4] = b"WMAP";
pub const GRAPH_FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    #[default]
    Binary,
    Json,
}

pub fn encode_graph(graph: &Graph, format: GraphFormat) -> Result<Vec<u8>, StorageError> {
    match format {
        GraphFormat::Binary => {
            let body = bincode::serialize(graph)?;
            let mut out = Vec::with_capacity(HEADER_LEN + body.len());
            out.extend_from_slice(GRAPH_MAGIC);
            out.extend_from_slice(&GRAPH_FORMAT_VERSION.to_le_bytes());
            out.extend_from_slice(&body);
            Ok(out)
        }
        GraphFormat::Json => Ok(serde_json::to_vec_pretty(graph)?),
    }
}

/// Which encoding `bytes` is in, if any.
pub fn detect_format(bytes: &[u8]) -> Option<GraphFormat> {
    if bytes.starts_with(GRAPH_MAGIC) {
        return Some(GraphFormat::Binary);
    }
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Some(GraphFormat::Json),
        _ => None,
    }
}

pub fn decode_graph(bytes: &[u8]) -> Result<Graph, StorageError> {
    match detect_format(bytes) {
        Some(GraphFormat::Binary) => {
            if bytes.len() < HEADER_LEN {
                return Err(StorageError::Truncated);
            }
            let mut version = [0u8; 4];
            version.copy_from_slice(&bytes[4..HEADER_LEN]);
            let version = u32::from_le_bytes(version);
            if version != GRAPH_FORMAT_VERSION {
                return Err(StorageError::UnsupportedVersion {
                    found: version,
                    expected: GRAPH_FORMAT_VERSION,
                });
            }
            Ok(bincode::deserialize(&bytes[HEADER_LEN..])?)
        }
        Some(GraphFormat::Json) => Ok(serde_json::from_slice(bytes)?),
        None => Err(StorageError::BadMagic),
    }
}

pub fn encode_snapshot<S: Snapshot>(snapshot: &S) -> Result<Vec<u8>, StorageError> {
    Ok(bincode::serialize(snapshot)?)
}

pub fn decode_snapshot<S: Snapshot>(bytes: &[u8]) -> Result<S, StorageError> {
    Ok(bincode::deserialize(bytes)?)
}
