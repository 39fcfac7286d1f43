//! # Inbound Port - RevocationLedgerApi

use crate::domain::{ConsentGrant, ConsentRecord, RevocationError, RevocationEvent};
use shared_types::{ConsentId, Timestamp};

/// Consent lifecycle API.
///
/// Anchoring of the creation and revocation hashes is best-effort: a queue
/// failure is logged and never fails `grant` or `revoke`.
pub trait RevocationLedgerApi: Send + Sync {
    /// Records a new consent and queues its creation hash.
    ///
    /// # Errors
    /// - `InvalidGrant`: empty parties or data types, or a duration outside 1s..100y
    fn grant(&self, request: ConsentGrant) -> Result<ConsentRecord, RevocationError>;

    /// Revokes a consent and queues the event hash.
    ///
    /// # Errors
    /// - `ConsentNotFound`
    /// - `AlreadyRevoked`: including when a concurrent call won the race
    /// - `Unauthorized`: `revoked_by` is not the consent's subject
    fn revoke(
        &self,
        consent_id: &ConsentId,
        revoked_by: &str,
        reason: Option<&str>,
    ) -> Result<RevocationEvent, RevocationError>;

    /// Looks up a consent.
    fn get_consent(&self, consent_id: &ConsentId) -> Result<Option<ConsentRecord>, RevocationError>;

    /// The revocation event of a consent, if revoked.
    fn revocation_event(
        &self,
        consent_id: &ConsentId,
    ) -> Result<Option<RevocationEvent>, RevocationError>;

    /// True if the consent exists, is not revoked and has not expired at `now`.
    fn is_active(&self, consent_id: &ConsentId, now: Timestamp) -> Result<bool, RevocationError>;
}
