//! # In-Memory Anchor Store
//!
//! ## Data Structures
//!
//! - `entries`: O(1) lookup by entry id
//! - `pending`: `(queued_at, id)` ordered set, only `Pending` entries
//! - `in_flight`: hashes with a `Processing` entry
//! - `anchors` / `anchor_by_hash`: anchor records and the unique hash index
//!
//! Every trait method takes the single write lock once, so each conditional
//! update is atomic with respect to all other callers in the process.

use crate::domain::{AnchorQueueEntry, AnchorRecord, AnchorStatus, ClaimToken, QueueStatus};
use crate::ports::AnchorStore;
use parking_lot::RwLock;
use shared_types::{AnchorId, EntryId, Hash, StoreError, Timestamp};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Default)]
struct Tables {
    entries: HashMap<EntryId, AnchorQueueEntry>,
    pending: BTreeSet<(Timestamp, EntryId)>,
    in_flight: HashSet<Hash>,
    anchors: HashMap<AnchorId, AnchorRecord>,
    anchor_by_hash: HashMap<Hash, AnchorId>,
}

impl Tables {
    fn unindex(&mut self, entry: &AnchorQueueEntry) {
        match entry.status {
            AnchorStatus::Pending => {
                self.pending.remove(&(entry.queued_at, entry.id));
            }
            AnchorStatus::Processing => {
                self.in_flight.remove(entry.hash.digest());
            }
            AnchorStatus::Anchored | AnchorStatus::Failed => {}
        }
    }

    fn index(&mut self, entry: &AnchorQueueEntry) {
        match entry.status {
            AnchorStatus::Pending => {
                self.pending.insert((entry.queued_at, entry.id));
            }
            AnchorStatus::Processing => {
                self.in_flight.insert(*entry.hash.digest());
            }
            AnchorStatus::Anchored | AnchorStatus::Failed => {}
        }
    }

    fn replace(&mut self, updated: AnchorQueueEntry) {
        if let Some(old) = self.entries.remove(&updated.id) {
            self.unindex(&old);
        }
        self.index(&updated);
        self.entries.insert(updated.id, updated);
    }

    fn insert_new(&mut self, entry: &AnchorQueueEntry) -> Result<(), StoreError> {
        if self.entries.contains_key(&entry.id) {
            return Err(StoreError::Conflict(format!("entry {} exists", entry.id)));
        }
        self.replace(entry.clone());
        Ok(())
    }

    fn anchor_for(&self, hash: &Hash) -> Option<&AnchorRecord> {
        self.anchor_by_hash
            .get(hash)
            .and_then(|id| self.anchors.get(id))
    }
}

/// Process-local `AnchorStore`.
#[derive(Debug, Default)]
pub struct InMemoryAnchorStore {
    tables: RwLock<Tables>,
}

impl InMemoryAnchorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnchorStore for InMemoryAnchorStore {
    fn insert_entry(&self, entry: &AnchorQueueEntry) -> Result<(), StoreError> {
        self.tables.write().insert_new(entry)
    }

    fn get_entry(&self, id: &EntryId) -> Result<Option<AnchorQueueEntry>, StoreError> {
        Ok(self.tables.read().entries.get(id).cloned())
    }

    fn pending_ids_oldest_first(&self, limit: usize) -> Result<Vec<EntryId>, StoreError> {
        Ok(self
            .tables
            .read()
            .pending
            .iter()
            .take(limit)
            .map(|(_, id)| *id)
            .collect())
    }

    fn try_claim(&self, id: &EntryId, now: Timestamp) -> Result<Option<AnchorQueueEntry>, StoreError> {
        let mut tables = self.tables.write();
        let Some(current) = tables.entries.get(id) else {
            return Ok(None);
        };
        if !current.is_pending() || tables.in_flight.contains(current.hash.digest()) {
            return Ok(None);
        }
        let mut claimed = current.clone();
        if claimed.claim(now).is_err() {
            return Ok(None);
        }
        tables.replace(claimed.clone());
        Ok(Some(claimed))
    }

    fn compare_and_swap(
        &self,
        expected: &AnchorQueueEntry,
        updated: &AnchorQueueEntry,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();
        match tables.entries.get(&updated.id) {
            Some(current) if current.same_state_as(expected) => {
                tables.replace(updated.clone());
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(format!("entry {}", updated.id))),
        }
    }

    fn complete_entry(
        &self,
        claim: &ClaimToken,
        candidate: AnchorRecord,
        now: Timestamp,
    ) -> Result<Option<AnchorRecord>, StoreError> {
        let mut tables = self.tables.write();
        let Some(current) = tables.entries.get(&claim.entry_id) else {
            return Err(StoreError::NotFound(format!("entry {}", claim.entry_id)));
        };
        if !current.is_claimed_by(claim) {
            return Ok(None);
        }
        let mut updated = current.clone();
        let digest = *updated.hash.digest();

        let anchor = match tables.anchor_for(&digest).cloned() {
            Some(mut existing) => {
                existing.subject_count = existing.subject_count.saturating_add(1);
                tables.anchors.insert(existing.id, existing.clone());
                existing
            }
            None => {
                tables.anchor_by_hash.insert(digest, candidate.id);
                tables.anchors.insert(candidate.id, candidate.clone());
                candidate
            }
        };

        updated
            .mark_anchored(anchor.id, now)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;
        tables.replace(updated);
        Ok(Some(anchor))
    }

    fn find_anchor_by_hash(&self, hash: &Hash) -> Result<Option<AnchorRecord>, StoreError> {
        Ok(self.tables.read().anchor_for(hash).cloned())
    }

    fn insert_or_attach(&self, entry: &AnchorQueueEntry) -> Result<Option<AnchorRecord>, StoreError> {
        let mut tables = self.tables.write();
        let digest = *entry.hash.digest();
        match tables.anchor_for(&digest).cloned() {
            Some(mut anchor) => {
                let attached = AnchorQueueEntry {
                    status: AnchorStatus::Anchored,
                    anchor_id: Some(anchor.id),
                    ..entry.clone()
                };
                tables.insert_new(&attached)?;
                anchor.subject_count = anchor.subject_count.saturating_add(1);
                tables.anchors.insert(anchor.id, anchor.clone());
                Ok(Some(anchor))
            }
            None => {
                tables.insert_new(entry)?;
                Ok(None)
            }
        }
    }

    fn entries_with_status(&self, status: AnchorStatus) -> Result<Vec<AnchorQueueEntry>, StoreError> {
        let tables = self.tables.read();
        let mut entries: Vec<_> = tables
            .entries
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.queued_at, e.id));
        Ok(entries)
    }

    fn status_counts(&self) -> Result<QueueStatus, StoreError> {
        let tables = self.tables.read();
        let mut status = QueueStatus {
            anchors: tables.anchors.len(),
            ..QueueStatus::default()
        };
        for entry in tables.entries.values() {
            match entry.status {
                AnchorStatus::Pending => status.pending += 1,
                AnchorStatus::Processing => status.processing += 1,
                AnchorStatus::Anchored => status.anchored += 1,
                AnchorStatus::Failed => status.failed += 1,
            }
        }
        Ok(status)
    }
}
