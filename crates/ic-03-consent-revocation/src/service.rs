//! Revocation Ledger Service

use crate::domain::{ConsentGrant, ConsentRecord, RevocationError, RevocationEvent};
use crate::ports::{ConsentStore, RevocationLedgerApi, RevokeOutcome};
use ic_01_anchor_queue::AnchorQueueApi;
use shared_crypto::ContentHash;
use shared_types::{ConsentId, SubjectId, SystemTimeSource, TimeSource, Timestamp};
use std::sync::Arc;
use tracing::{info, warn};

/// Consent grant and revocation service.
pub struct RevocationLedger {
    store: Arc<dyn ConsentStore>,
    anchor_queue: Arc<dyn AnchorQueueApi>,
    clock: Arc<dyn TimeSource>,
}

impl RevocationLedger {
    /// Creates a ledger using the system clock.
    pub fn new(store: Arc<dyn ConsentStore>, anchor_queue: Arc<dyn AnchorQueueApi>) -> Self {
        Self::with_clock(store, anchor_queue, Arc::new(SystemTimeSource))
    }

    /// Creates a ledger with an injected clock.
    pub fn with_clock(
        store: Arc<dyn ConsentStore>,
        anchor_queue: Arc<dyn AnchorQueueApi>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store,
            anchor_queue,
            clock,
        }
    }

    fn anchor(&self, hash: &ContentHash, subject_id: SubjectId) {
        if let Err(e) = self.anchor_queue.enqueue(hash, subject_id.clone()) {
            warn!(
                "[ic-03] ⚠️ Could not queue {} for anchoring ({}): {}",
                hash.short(),
                subject_id,
                e
            );
        }
    }
}

impl RevocationLedgerApi for RevocationLedger {
    fn grant(&self, request: ConsentGrant) -> Result<ConsentRecord, RevocationError> {
        let duration_secs = request.validate().map_err(RevocationError::InvalidGrant)?;
        let consent = ConsentRecord::new(
            request.subject_did,
            request.requester,
            request.data_types,
            duration_secs,
            self.clock.now(),
        )?;
        self.store.insert_consent(&consent)?;
        info!(
            "[ic-03] Consent {} granted by {} to {} ({} data types)",
            consent.id,
            consent.subject_did,
            consent.requester,
            consent.data_types.len()
        );

        self.anchor(&consent.creation_hash, SubjectId::from(consent.id));
        Ok(consent)
    }

    fn revoke(
        &self,
        consent_id: &ConsentId,
        revoked_by: &str,
        reason: Option<&str>,
    ) -> Result<RevocationEvent, RevocationError> {
        let consent = self
            .store
            .get_consent(consent_id)?
            .ok_or(RevocationError::ConsentNotFound(*consent_id))?;
        if consent.revoked {
            return Err(RevocationError::AlreadyRevoked(*consent_id));
        }
        if consent.subject_did != revoked_by {
            warn!(
                "[ic-03] Rejected revocation of {} by non-subject {}",
                consent_id, revoked_by
            );
            return Err(RevocationError::Unauthorized {
                consent_id: *consent_id,
                revoked_by: revoked_by.to_string(),
            });
        }

        let event = RevocationEvent::new(
            *consent_id,
            revoked_by.to_string(),
            reason.map(str::to_string),
            self.clock.now(),
        )?;
        match self.store.revoke(&event)? {
            RevokeOutcome::Revoked(_) => {}
            RevokeOutcome::AlreadyRevoked => return Err(RevocationError::AlreadyRevoked(*consent_id)),
            RevokeOutcome::NotFound => return Err(RevocationError::ConsentNotFound(*consent_id)),
        }
        info!(
            "[ic-03] 🔒 Consent {} revoked by {} (event {})",
            consent_id, revoked_by, event.id
        );

        self.anchor(&event.event_hash, SubjectId::from(event.id));
        Ok(event)
    }

    fn get_consent(&self, consent_id: &ConsentId) -> Result<Option<ConsentRecord>, RevocationError> {
        Ok(self.store.get_consent(consent_id)?)
    }

    fn revocation_event(
        &self,
        consent_id: &ConsentId,
    ) -> Result<Option<RevocationEvent>, RevocationError> {
        Ok(self.store.revocation_event(consent_id)?)
    }

    fn is_active(&self, consent_id: &ConsentId, now: Timestamp) -> Result<bool, RevocationError> {
        Ok(self
            .store
            .get_consent(consent_id)?
            .is_some_and(|c| c.is_active(now)))
    }
}
