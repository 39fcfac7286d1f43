//! # Integrity Pipeline
//!
//! Facade over the subsystems for the portal's request handlers.
//!
//! ```text
//! seal_record:   plaintext ──HybridCipher──→ EncryptedPayload
//!                fields ──HashEngine──→ ContentHash ──→ AnchorQueue
//! grant/revoke:  RevocationLedger (queues its own hashes)
//! export_audit:  AuditExporter ──→ ExportArtifact ──→ AnchorQueue
//! anchor:        AnchorSubmitter.run(batch) ──→ Ledger
//! ```
//!
//! Anchoring is asynchronous: a failed enqueue is logged and the caller
//! still gets its result. Every state-changing call appends an audit row
//! after the change is made; a rejected append is logged at error level and
//! does not undo or fail the change.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use ic_01_anchor_queue::{AnchorQueueApi, AnchorQueueError, AnchorRecord, EnqueueOutcome};
use ic_02_anchor_submitter::{AnchorSubmitterApi, RunReport, SubmitterError};
use ic_03_consent_revocation::{
    ConsentGrant, ConsentRecord, RevocationError, RevocationEvent, RevocationLedgerApi,
};
use ic_04_audit_export::{AuditExportError, AuditExporterApi, AuditRow, ExportArtifact};
use shared_crypto::{
    CanonicalSubject, ContentHash, CryptoError, DecryptionError, EncryptedPayload, HashEngine,
    HybridCipher, RecipientPrivateKey, RecipientPublicKey, RecordFields,
};
use shared_types::{ConsentId, SubjectId, TimeSource, Timestamp};

use crate::container::IntegrityContainer;

/// Errors surfaced by the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Record encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(#[from] CryptoError),

    /// Record fields could not be canonically hashed.
    #[error("hashing failed: {0}")]
    Hashing(CryptoError),

    /// Record decryption failed.
    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    /// Consent operation rejected.
    #[error(transparent)]
    Consent(#[from] RevocationError),

    /// Audit log operation failed.
    #[error(transparent)]
    Audit(#[from] AuditExportError),

    /// Queue lookup failed.
    #[error(transparent)]
    Queue(#[from] AnchorQueueError),

    /// Submitter run failed.
    #[error(transparent)]
    Anchoring(#[from] SubmitterError),
}

/// Output of `seal_record`.
#[derive(Clone, Debug)]
pub struct SealedRecord {
    /// Encrypted record body.
    pub payload: EncryptedPayload,
    /// Hash of the record's canonical fields.
    pub content_hash: ContentHash,
    /// Queue outcome; `None` if the enqueue failed and was logged.
    pub anchor: Option<EnqueueOutcome>,
}

/// Request-path facade.
#[derive(Clone)]
pub struct IntegrityPipeline {
    cipher: HybridCipher,
    anchor_queue: Arc<dyn AnchorQueueApi>,
    submitter: Arc<dyn AnchorSubmitterApi>,
    revocations: Arc<dyn RevocationLedgerApi>,
    audit: Arc<dyn AuditExporterApi>,
    clock: Arc<dyn TimeSource>,
    batch_size: usize,
}

impl IntegrityPipeline {
    /// Builds the facade from a wired container.
    pub fn new(container: &IntegrityContainer) -> Self {
        Self {
            cipher: container.cipher.clone(),
            anchor_queue: Arc::clone(&container.anchor_queue),
            submitter: Arc::clone(&container.submitter),
            revocations: Arc::clone(&container.revocations),
            audit: Arc::clone(&container.audit),
            clock: Arc::clone(&container.clock),
            batch_size: container.config.anchoring.batch_size,
        }
    }

    fn queue_for_anchoring(&self, hash: &ContentHash, subject_id: SubjectId) -> Option<EnqueueOutcome> {
        match self.anchor_queue.enqueue(hash, subject_id.clone()) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(
                    "[ic-runtime] ⚠️ Could not queue {} for anchoring ({}): {}",
                    hash.short(),
                    subject_id,
                    e
                );
                None
            }
        }
    }

    fn append_audit(
        &self,
        actor: &str,
        action: &str,
        resource: String,
        details: Option<String>,
    ) {
        let mut row = AuditRow::new(self.clock.now(), actor, action, &resource, "success");
        if let Some(details) = details {
            row = row.with_details(details);
        }
        if let Err(e) = self.audit.record(row) {
            error!(
                "[ic-runtime] ❌ Audit row for {} on {} by {} was not stored: {}",
                action, resource, actor, e
            );
        }
    }

    /// Encrypts a record for `recipient`, hashes its canonical fields and
    /// queues the hash for anchoring.
    pub fn seal_record(
        &self,
        record: RecordFields,
        recipient: &RecipientPublicKey,
        actor: &str,
    ) -> Result<SealedRecord, PipelineError> {
        let payload = self.cipher.encrypt(record.content.as_bytes(), recipient)?;
        let record_id = record.record_id.clone();
        let content_hash = HashEngine::digest_subject(&CanonicalSubject::Record(record))
            .map_err(PipelineError::Hashing)?;
        let anchor = self.queue_for_anchoring(&content_hash, SubjectId::new(record_id.clone()));

        self.append_audit(
            actor,
            "seal_record",
            format!("record:{record_id}"),
            Some(content_hash.to_hex()),
        );
        info!("[ic-runtime] 🔒 Sealed record {} ({})", record_id, content_hash.short());

        Ok(SealedRecord {
            payload,
            content_hash,
            anchor,
        })
    }

    /// Decrypts a sealed record body.
    pub fn open_record(
        &self,
        payload: &EncryptedPayload,
        recipient: &RecipientPrivateKey,
    ) -> Result<Vec<u8>, PipelineError> {
        Ok(self.cipher.decrypt(payload, recipient)?)
    }

    /// Recomputes the record hash and compares.
    pub fn verify_record(&self, record: &RecordFields, expected: &ContentHash) -> bool {
        HashEngine::verify(&CanonicalSubject::Record(record.clone()), expected)
    }

    /// Records a consent grant.
    pub fn grant_consent(&self, grant: ConsentGrant) -> Result<ConsentRecord, PipelineError> {
        let actor = grant.subject_did.clone();
        let consent = self.revocations.grant(grant)?;
        self.append_audit(
            &actor,
            "grant_consent",
            format!("consent:{}", consent.id),
            Some(consent.creation_hash.to_hex()),
        );
        Ok(consent)
    }

    /// Revokes a consent. Irreversible.
    pub fn revoke_consent(
        &self,
        consent_id: &ConsentId,
        revoked_by: &str,
        reason: Option<&str>,
    ) -> Result<RevocationEvent, PipelineError> {
        let event = self.revocations.revoke(consent_id, revoked_by, reason)?;
        self.append_audit(
            revoked_by,
            "revoke_consent",
            format!("consent:{consent_id}"),
            Some(event.event_hash.to_hex()),
        );
        Ok(event)
    }

    /// Returns whether a consent is currently in force.
    pub fn consent_active(&self, consent_id: &ConsentId) -> Result<bool, PipelineError> {
        Ok(self.revocations.is_active(consent_id, self.clock.now())?)
    }

    /// Exports audit rows in `[since, until]` and queues the export hash.
    pub fn export_audit(
        &self,
        since: Timestamp,
        until: Timestamp,
        exported_by: &str,
    ) -> Result<ExportArtifact, PipelineError> {
        let artifact = self.audit.export(since, until, exported_by)?;
        self.queue_for_anchoring(&artifact.export_hash, SubjectId::from(artifact.record_id));
        Ok(artifact)
    }

    /// Runs one submitter pass with the configured batch size.
    pub async fn anchor_pending(&self) -> Result<RunReport, PipelineError> {
        Ok(self.submitter.run(self.batch_size).await?)
    }

    /// Anchor for a hash, if confirmed.
    pub fn anchor_for(&self, hash: &ContentHash) -> Result<Option<AnchorRecord>, PipelineError> {
        Ok(self.anchor_queue.find_anchor(hash)?)
    }
}
