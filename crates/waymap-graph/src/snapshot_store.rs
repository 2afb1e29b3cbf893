//! Content-addressed, immutable snapshot storage.
//!
//! A store owns the snapshot payloads of one kind. Waypoints and edges only
//! hold ids into it, so an id the store does not know is a detectable
//! dangling reference rather than a broken pointer.
//!
//! Identity rules:
//! - `put` with an empty id assigns the content digest.
//! - `put` under an existing id succeeds only if the content is identical
//!   (idempotent re-put); anything else is an `IdentityConflict`.
//! - `derive` always yields a new id whose `version_id` is the parent.

use crate::error::{MapError, MapResult, RecordKind};
use ahash::AHashMap;
use std::collections::BTreeSet;
use waymap_model::{content_digest, is_content_digest, Snapshot, SnapshotId, VersionedSnapshot};

pub struct SnapshotStore<S: Snapshot> {
    snapshots: AHashMap<SnapshotId, S>,
    /// Digest of each stored snapshot's content, cached for conflict checks.
    digests: AHashMap<SnapshotId, SnapshotId>,
}

impl<S: Snapshot> SnapshotStore<S> {
    pub fn new() -> Self {
        Self {
            snapshots: AHashMap::new(),
            digests: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.snapshots.contains_key(id)
    }

    /// Stored ids in sorted order.
    pub fn ids(&self) -> Vec<SnapshotId> {
        let mut ids: Vec<SnapshotId> = self.snapshots.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run every check `put` would run, without storing anything.
    ///
    /// Returns the id the snapshot would be stored under. A digest-shaped
    /// id must be the digest of the content; any other caller-chosen id is
    /// taken as given.
    pub fn check_put(&self, snapshot: &S) -> MapResult<SnapshotId> {
        self.admit(snapshot).map(|(id, _)| id)
    }

    /// Storage id and content digest of an admissible snapshot.
    fn admit(&self, snapshot: &S) -> MapResult<(SnapshotId, SnapshotId)> {
        snapshot.check_content()?;
        let digest = content_digest(snapshot)?;
        let id = if snapshot.id().is_empty() {
            digest.clone()
        } else {
            snapshot.id().clone()
        };

        if is_content_digest(&id) && id != digest {
            tracing::warn!(kind = %S::KIND, snapshot = %id, "rejected snapshot whose id is not its digest");
            return Err(MapError::IdentityConflict {
                kind: S::KIND,
                id: id.to_string(),
            });
        }
        if let Some(existing) = self.digests.get(&id) {
            if existing != &digest {
                tracing::warn!(kind = %S::KIND, snapshot = %id, "rejected snapshot with conflicting content");
                return Err(MapError::IdentityConflict {
                    kind: S::KIND,
                    id: id.to_string(),
                });
            }
        }
        Ok((id, digest))
    }

    /// Store a snapshot and return the id it is stored under.
    pub fn put(&mut self, mut snapshot: S) -> MapResult<SnapshotId> {
        let (id, digest) = self.admit(&snapshot)?;
        if self.digests.contains_key(&id) {
            tracing::debug!(kind = %S::KIND, snapshot = %id, "snapshot already stored");
            return Ok(id);
        }

        snapshot.set_id(id.clone());
        self.digests.insert(id.clone(), digest);
        self.snapshots.insert(id.clone(), snapshot);
        tracing::debug!(kind = %S::KIND, snapshot = %id, "stored snapshot");
        Ok(id)
    }

    /// Check a batch against the store and against itself, without storing
    /// anything.
    pub fn check_put_all(&self, snapshots: &[S]) -> MapResult<()> {
        let mut staged: AHashMap<SnapshotId, SnapshotId> = AHashMap::new();
        for snapshot in snapshots {
            let (id, digest) = self.admit(snapshot)?;
            if let Some(earlier) = staged.insert(id.clone(), digest.clone()) {
                if earlier != digest {
                    return Err(MapError::IdentityConflict {
                        kind: S::KIND,
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Store a batch of snapshots, all or nothing.
    pub fn put_all(&mut self, snapshots: Vec<S>) -> MapResult<Vec<SnapshotId>> {
        self.check_put_all(&snapshots)?;
        let mut ids = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            ids.push(self.put(snapshot)?);
        }
        Ok(ids)
    }

    pub fn get(&self, id: &SnapshotId) -> MapResult<&S> {
        self.snapshots
            .get(id)
            .ok_or_else(|| MapError::not_found(RecordKind::Snapshot(S::KIND), id))
    }

    /// Remove a snapshot from memory. Derived snapshots keep their
    /// `version_id` even when the parent is gone.
    pub fn evict(&mut self, id: &SnapshotId) -> MapResult<S> {
        let snapshot = self
            .snapshots
            .remove(id)
            .ok_or_else(|| MapError::not_found(RecordKind::Snapshot(S::KIND), id))?;
        self.digests.remove(id);
        tracing::debug!(kind = %S::KIND, snapshot = %id, "evicted snapshot");
        Ok(snapshot)
    }

    /// Content digest of a stored snapshot.
    pub fn digest_of(&self, id: &SnapshotId) -> Option<&SnapshotId> {
        self.digests.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.snapshots.values()
    }
}

impl<S: VersionedSnapshot> SnapshotStore<S> {
    /// Derive a processed snapshot from `parent_id`.
    ///
    /// `transform` edits a copy of the parent. The result is stored under its
    /// content digest with `version_id = parent_id`; the parent is untouched.
    pub fn derive<F>(&mut self, parent_id: &SnapshotId, transform: F) -> MapResult<SnapshotId>
    where
        F: FnOnce(&mut S),
    {
        let mut derived = self.get(parent_id)?.clone();
        transform(&mut derived);
        derived.set_version_id(parent_id.clone());
        derived.set_id(SnapshotId::default());

        let digest = content_digest(&derived)?;
        if &digest == parent_id {
            return Err(MapError::IdentityConflict {
                kind: S::KIND,
                id: digest.to_string(),
            });
        }
        let id = self.put(derived)?;
        tracing::debug!(kind = %S::KIND, parent = %parent_id, snapshot = %id, "derived snapshot");
        Ok(id)
    }

    /// Ids of snapshots derived directly from `parent_id`, sorted.
    pub fn derived_from(&self, parent_id: &SnapshotId) -> Vec<SnapshotId> {
        let mut out: Vec<SnapshotId> = self
            .snapshots
            .values()
            .filter(|s| s.version_id() == parent_id)
            .map(|s| s.id().clone())
            .collect();
        out.sort();
        out
    }

    /// Follow `version_id` links back to the raw snapshot.
    ///
    /// Stops at the last snapshot present in the store if the chain leaves
    /// it (parent evicted). Returns `None` on a cyclic chain.
    pub fn raw_of(&self, id: &SnapshotId) -> MapResult<Option<SnapshotId>> {
        let mut current = self.get(id)?;
        let mut seen = BTreeSet::new();
        loop {
            if !seen.insert(current.id().clone()) {
                return Ok(None);
            }
            if current.is_raw() {
                return Ok(Some(current.id().clone()));
            }
            match self.snapshots.get(current.version_id()) {
                Some(parent) => current = parent,
                None => return Ok(Some(current.id().clone())),
            }
        }
    }
}

impl<S: Snapshot> Default for SnapshotStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
