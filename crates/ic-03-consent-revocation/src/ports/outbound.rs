//! Outbound (Driven) ports for the Consent & Revocation subsystem.

use crate::domain::{ConsentRecord, RevocationEvent};
use shared_types::{ConsentId, StoreError};

/// Result of the atomic revoke write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The flag flipped and the event was stored. Carries the updated consent.
    Revoked(ConsentRecord),
    /// The consent was already revoked; nothing written.
    AlreadyRevoked,
    /// No such consent; nothing written.
    NotFound,
}

/// Durable storage for consents and revocation events.
pub trait ConsentStore: Send + Sync {
    /// Inserts a new consent.
    ///
    /// # Errors
    /// - `StoreError::Conflict`: id already present
    fn insert_consent(&self, consent: &ConsentRecord) -> Result<(), StoreError>;

    /// Gets a consent by id.
    fn get_consent(&self, id: &ConsentId) -> Result<Option<ConsentRecord>, StoreError>;

    /// One logical unit: compare-and-swap `revoked` false → true (stamping
    /// `revoked_at = event.revoked_at`) and insert `event`. Either both are
    /// written or neither.
    fn revoke(&self, event: &RevocationEvent) -> Result<RevokeOutcome, StoreError>;

    /// Gets the revocation event of a consent.
    fn revocation_event(&self, consent_id: &ConsentId) -> Result<Option<RevocationEvent>, StoreError>;
}
