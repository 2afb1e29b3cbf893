//! Content digests for snapshot identity.
//!
//! - algorithm: **SHA-256**
//! - input: bincode encoding of the snapshot with its `id` field cleared
//! - output: `"sha256:<64 lowercase hex digits>"`
//!
//! Every collection in the snapshot types is a `Vec` or an ordered map, so the
//! encoding (and therefore the digest) is deterministic.

use crate::ids::SnapshotId;
use crate::snapshot::Snapshot;
use sha2::{Digest, Sha256};
use std::fmt::Write;
use thiserror::Error;

/// Prefix used in serialized snapshot digests.
pub const SNAPSHOT_DIGEST_PREFIX: &str = "sha256:";

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("failed to encode snapshot for hashing: {0}")]
    Encode(#[from] bincode::Error),
}

/// Digest of a snapshot's content. The snapshot's own id does not contribute.
pub fn content_digest<S: Snapshot>(snapshot: &S) -> Result<SnapshotId, DigestError> {
    let mut anonymous = snapshot.clone();
    anonymous.set_id(SnapshotId::default());
    let bytes = bincode::serialize(&anonymous)?;
    Ok(SnapshotId::new(digest_bytes(&bytes)))
}

/// `"sha256:<hex>"` over arbitrary bytes.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    let mut out = String::with_capacity(SNAPSHOT_DIGEST_PREFIX.len() + 64);
    out.push_str(SNAPSHOT_DIGEST_PREFIX);
    for b in hash.iter() {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Whether `id` has the shape of a digest produced by [`content_digest`].
pub fn is_content_digest(id: &SnapshotId) -> bool {
    id.as_str()
        .strip_prefix(SNAPSHOT_DIGEST_PREFIX)
        .is_some_and(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{OpaquePayload, WaypointSnapshot};

    fn snapshot_with_state(bytes: &[u8]) -> WaypointSnapshot {
        WaypointSnapshot {
            robot_state: Some(OpaquePayload::new("raw", bytes.to_vec())),
            ..WaypointSnapshot::default()
        }
    }

    #[test]
    fn digest_has_expected_prefix_and_width() {
        let d = content_digest(&snapshot_with_state(b"x")).unwrap();
        assert!(d.as_str().starts_with(SNAPSHOT_DIGEST_PREFIX));
        assert_eq!(d.as_str().len(), SNAPSHOT_DIGEST_PREFIX.len() + 64);
        assert!(is_content_digest(&d));
    }

    #[test]
    fn digest_ignores_id_field() {
        let mut a = snapshot_with_state(b"x");
        let b = a.clone();
        a.id = SnapshotId::new("caller-chosen");
        assert_eq!(content_digest(&a).unwrap(), content_digest(&b).unwrap());
    }

    #[test]
    fn digest_changes_when_payload_changes() {
        let a = content_digest(&snapshot_with_state(b"x")).unwrap();
        let b = content_digest(&snapshot_with_state(b"y")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn plain_ids_are_not_digests() {
        assert!(!is_content_digest(&SnapshotId::new("snapshot_abc")));
        assert!(!is_content_digest(&SnapshotId::new("sha256:xyz")));
    }
}
