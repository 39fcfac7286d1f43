//! In-memory `ConsentStore`. Consents and events share one lock so a revoke
//! is never half-visible.

use crate::domain::{ConsentRecord, RevocationEvent};
use crate::ports::{ConsentStore, RevokeOutcome};
use parking_lot::RwLock;
use shared_types::{ConsentId, StoreError};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Tables {
    consents: HashMap<ConsentId, ConsentRecord>,
    events: HashMap<ConsentId, RevocationEvent>,
}

/// Process-local `ConsentStore`.
#[derive(Debug, Default)]
pub struct InMemoryConsentStore {
    tables: RwLock<Tables>,
}

impl InMemoryConsentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsentStore for InMemoryConsentStore {
    fn insert_consent(&self, consent: &ConsentRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.consents.contains_key(&consent.id) {
            return Err(StoreError::Conflict(format!("consent {} exists", consent.id)));
        }
        tables.consents.insert(consent.id, consent.clone());
        Ok(())
    }

    fn get_consent(&self, id: &ConsentId) -> Result<Option<ConsentRecord>, StoreError> {
        Ok(self.tables.read().consents.get(id).cloned())
    }

    fn revoke(&self, event: &RevocationEvent) -> Result<RevokeOutcome, StoreError> {
        let mut tables = self.tables.write();
        let Some(consent) = tables.consents.get_mut(&event.consent_id) else {
            return Ok(RevokeOutcome::NotFound);
        };
        if !consent.mark_revoked(event.revoked_at) {
            return Ok(RevokeOutcome::AlreadyRevoked);
        }
        let updated = consent.clone();
        tables.events.insert(event.consent_id, event.clone());
        Ok(RevokeOutcome::Revoked(updated))
    }

    fn revocation_event(&self, consent_id: &ConsentId) -> Result<Option<RevocationEvent>, StoreError> {
        Ok(self.tables.read().events.get(consent_id).cloned())
    }
}
