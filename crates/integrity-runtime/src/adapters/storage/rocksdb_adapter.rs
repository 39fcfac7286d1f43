//! # RocksDB Anchor Store
//!
//! Durable `AnchorStore` for the anchor queue.
//!
//! ## Column Families
//!
//! - `anchor_entries` - queue entries by entry id
//! - `anchor_pending` - claim-order index: `(queued_at, id)` → id, pending only
//! - `anchor_in_flight` - digest → id for entries in `Processing`
//! - `anchor_records` - anchor records by anchor id
//! - `anchor_hash_index` - digest → anchor id (unique)
//!
//! Rows are bincode-encoded. Each conditional update reads, decides and
//! commits one `WriteBatch` while holding the write lock, so the checks and
//! the index maintenance land together. RocksDB's own LOCK file keeps a
//! second process from opening the same directory.

use ic_01_anchor_queue::{
    AnchorQueueEntry, AnchorRecord, AnchorStatus, AnchorStore, ClaimToken, QueueStatus,
};
use parking_lot::RwLock;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use shared_types::{AnchorId, EntryId, Hash, StoreError, Timestamp};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Queue entries.
pub const CF_ENTRIES: &str = "anchor_entries";
/// Pending claim-order index.
pub const CF_PENDING: &str = "anchor_pending";
/// Processing digests.
pub const CF_IN_FLIGHT: &str = "anchor_in_flight";
/// Anchor records.
pub const CF_RECORDS: &str = "anchor_records";
/// Digest → anchor id.
pub const CF_HASH_INDEX: &str = "anchor_hash_index";

/// All column families opened by the store.
pub const COLUMN_FAMILIES: &[&str] = &[CF_ENTRIES, CF_PENDING, CF_IN_FLIGHT, CF_RECORDS, CF_HASH_INDEX];

/// RocksDB tuning for the anchor store.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB).
    pub write_buffer_size: usize,
    /// fsync after each batch (default: true).
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/anchor-queue"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Stores under `data_dir/anchor-queue`.
    pub fn in_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("anchor-queue"),
            ..Self::default()
        }
    }

    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed anchor store.
pub struct RocksDbAnchorStore {
    db: Arc<RwLock<DB>>,
    config: RocksDbConfig,
}

impl std::fmt::Debug for RocksDbAnchorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbAnchorStore")
            .field("path", &self.config.path)
            .finish()
    }
}

fn backend(context: &str, e: rocksdb::Error) -> StoreError {
    StoreError::Backend(format!("RocksDB {context} failed: {e}"))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode_id(bytes: &[u8]) -> Result<Uuid, StoreError> {
    Uuid::from_slice(bytes).map_err(|e| StoreError::Codec(e.to_string()))
}

/// Big-endian key that sorts by `(queued_at, id)`.
fn pending_key(entry: &AnchorQueueEntry) -> Vec<u8> {
    let secs = (entry.queued_at.timestamp() as u64) ^ (1 << 63);
    let mut key = Vec::with_capacity(8 + 4 + 16);
    key.extend_from_slice(&secs.to_be_bytes());
    key.extend_from_slice(&entry.queued_at.timestamp_subsec_nanos().to_be_bytes());
    key.extend_from_slice(entry.id.as_bytes());
    key
}

fn cf<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily, StoreError> {
    db.cf_handle(name)
        .ok_or_else(|| StoreError::Backend(format!("missing column family {name}")))
}

impl RocksDbAnchorStore {
    /// Opens or creates the database.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| backend("open", e))?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
        })
    }

    /// Database directory.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn write(&self, db: &DB, batch: WriteBatch) -> Result<(), StoreError> {
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        db.write_opt(batch, &write_opts).map_err(|e| backend("write", e))
    }

    fn load_entry(db: &DB, id: &EntryId) -> Result<Option<AnchorQueueEntry>, StoreError> {
        db.get_cf(cf(db, CF_ENTRIES)?, id.as_bytes())
            .map_err(|e| backend("get", e))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn load_anchor_for(db: &DB, hash: &Hash) -> Result<Option<AnchorRecord>, StoreError> {
        let Some(id_bytes) = db
            .get_cf(cf(db, CF_HASH_INDEX)?, hash)
            .map_err(|e| backend("get", e))?
        else {
            return Ok(None);
        };
        let anchor_id: AnchorId = decode_id(&id_bytes)?;
        db.get_cf(cf(db, CF_RECORDS)?, anchor_id.as_bytes())
            .map_err(|e| backend("get", e))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn is_in_flight(db: &DB, hash: &Hash) -> Result<bool, StoreError> {
        Ok(db
            .get_cf(cf(db, CF_IN_FLIGHT)?, hash)
            .map_err(|e| backend("get", e))?
            .is_some())
    }

    /// Stages `updated` plus index changes relative to `previous`.
    fn stage_entry(
        db: &DB,
        batch: &mut WriteBatch,
        previous: Option<&AnchorQueueEntry>,
        updated: &AnchorQueueEntry,
    ) -> Result<(), StoreError> {
        let pending = cf(db, CF_PENDING)?;
        let in_flight = cf(db, CF_IN_FLIGHT)?;

        if let Some(old) = previous {
            match old.status {
                AnchorStatus::Pending => batch.delete_cf(pending, pending_key(old)),
                AnchorStatus::Processing => batch.delete_cf(in_flight, old.hash.digest()),
                AnchorStatus::Anchored | AnchorStatus::Failed => {}
            }
        }
        match updated.status {
            AnchorStatus::Pending => batch.put_cf(pending, pending_key(updated), updated.id.as_bytes()),
            AnchorStatus::Processing => {
                batch.put_cf(in_flight, updated.hash.digest(), updated.id.as_bytes())
            }
            AnchorStatus::Anchored | AnchorStatus::Failed => {}
        }
        batch.put_cf(cf(db, CF_ENTRIES)?, updated.id.as_bytes(), encode(updated)?);
        Ok(())
    }

    fn stage_anchor(db: &DB, batch: &mut WriteBatch, anchor: &AnchorRecord) -> Result<(), StoreError> {
        batch.put_cf(cf(db, CF_RECORDS)?, anchor.id.as_bytes(), encode(anchor)?);
        batch.put_cf(cf(db, CF_HASH_INDEX)?, anchor.hash.digest(), anchor.id.as_bytes());
        Ok(())
    }

    fn scan_entries(db: &DB) -> Result<Vec<AnchorQueueEntry>, StoreError> {
        db.iterator_cf(cf(db, CF_ENTRIES)?, IteratorMode::Start)
            .map(|item| {
                let (_, value) = item.map_err(|e| backend("iterate", e))?;
                decode(&value)
            })
            .collect()
    }
}

impl AnchorStore for RocksDbAnchorStore {
    fn insert_entry(&self, entry: &AnchorQueueEntry) -> Result<(), StoreError> {
        let db = self.db.write();
        if Self::load_entry(&db, &entry.id)?.is_some() {
            return Err(StoreError::Conflict(format!("entry {} exists", entry.id)));
        }
        let mut batch = WriteBatch::default();
        Self::stage_entry(&db, &mut batch, None, entry)?;
        self.write(&db, batch)
    }

    fn get_entry(&self, id: &EntryId) -> Result<Option<AnchorQueueEntry>, StoreError> {
        let db = self.db.read();
        Self::load_entry(&db, id)
    }

    fn pending_ids_oldest_first(&self, limit: usize) -> Result<Vec<EntryId>, StoreError> {
        let db = self.db.read();
        let ids = db
            .iterator_cf(cf(&db, CF_PENDING)?, IteratorMode::Start)
            .take(limit)
            .map(|item| {
                let (_, value) = item.map_err(|e| backend("iterate", e))?;
                decode_id(&value)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn try_claim(&self, id: &EntryId, now: Timestamp) -> Result<Option<AnchorQueueEntry>, StoreError> {
        let db = self.db.write();
        let Some(current) = Self::load_entry(&db, id)? else {
            return Ok(None);
        };
        if !current.is_pending() || Self::is_in_flight(&db, current.hash.digest())? {
            return Ok(None);
        }
        let mut claimed = current.clone();
        if claimed.claim(now).is_err() {
            return Ok(None);
        }
        let mut batch = WriteBatch::default();
        Self::stage_entry(&db, &mut batch, Some(&current), &claimed)?;
        self.write(&db, batch)?;
        Ok(Some(claimed))
    }

    fn compare_and_swap(
        &self,
        expected: &AnchorQueueEntry,
        updated: &AnchorQueueEntry,
    ) -> Result<bool, StoreError> {
        let db = self.db.write();
        let Some(current) = Self::load_entry(&db, &updated.id)? else {
            return Err(StoreError::NotFound(format!("entry {}", updated.id)));
        };
        if !current.same_state_as(expected) {
            return Ok(false);
        }
        let mut batch = WriteBatch::default();
        Self::stage_entry(&db, &mut batch, Some(&current), updated)?;
        self.write(&db, batch)?;
        Ok(true)
    }

    fn complete_entry(
        &self,
        claim: &ClaimToken,
        candidate: AnchorRecord,
        now: Timestamp,
    ) -> Result<Option<AnchorRecord>, StoreError> {
        let db = self.db.write();
        let Some(current) = Self::load_entry(&db, &claim.entry_id)? else {
            return Err(StoreError::NotFound(format!("entry {}", claim.entry_id)));
        };
        if !current.is_claimed_by(claim) {
            return Ok(None);
        }

        let anchor = match Self::load_anchor_for(&db, current.hash.digest())? {
            Some(mut existing) => {
                existing.subject_count = existing.subject_count.saturating_add(1);
                existing
            }
            None => candidate,
        };

        let mut updated = current.clone();
        updated
            .mark_anchored(anchor.id, now)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;

        let mut batch = WriteBatch::default();
        Self::stage_anchor(&db, &mut batch, &anchor)?;
        Self::stage_entry(&db, &mut batch, Some(&current), &updated)?;
        self.write(&db, batch)?;
        Ok(Some(anchor))
    }

    fn find_anchor_by_hash(&self, hash: &Hash) -> Result<Option<AnchorRecord>, StoreError> {
        let db = self.db.read();
        Self::load_anchor_for(&db, hash)
    }

    fn insert_or_attach(&self, entry: &AnchorQueueEntry) -> Result<Option<AnchorRecord>, StoreError> {
        let db = self.db.write();
        if Self::load_entry(&db, &entry.id)?.is_some() {
            return Err(StoreError::Conflict(format!("entry {} exists", entry.id)));
        }

        let mut batch = WriteBatch::default();
        let attached = match Self::load_anchor_for(&db, entry.hash.digest())? {
            Some(mut anchor) => {
                let resolved = AnchorQueueEntry {
                    status: AnchorStatus::Anchored,
                    anchor_id: Some(anchor.id),
                    ..entry.clone()
                };
                anchor.subject_count = anchor.subject_count.saturating_add(1);
                Self::stage_entry(&db, &mut batch, None, &resolved)?;
                Self::stage_anchor(&db, &mut batch, &anchor)?;
                Some(anchor)
            }
            None => {
                Self::stage_entry(&db, &mut batch, None, entry)?;
                None
            }
        };
        self.write(&db, batch)?;
        Ok(attached)
    }

    fn entries_with_status(&self, status: AnchorStatus) -> Result<Vec<AnchorQueueEntry>, StoreError> {
        let db = self.db.read();
        let mut entries: Vec<_> = Self::scan_entries(&db)?
            .into_iter()
            .filter(|e| e.status == status)
            .collect();
        entries.sort_by_key(|e| (e.queued_at, e.id));
        Ok(entries)
    }

    fn status_counts(&self) -> Result<QueueStatus, StoreError> {
        let db = self.db.read();
        let mut status = QueueStatus {
            anchors: db
                .iterator_cf(cf(&db, CF_RECORDS)?, IteratorMode::Start)
                .count(),
            ..QueueStatus::default()
        };
        for entry in Self::scan_entries(&db)? {
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
