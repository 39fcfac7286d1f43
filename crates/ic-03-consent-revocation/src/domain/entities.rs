//! Consent and revocation entities.
//!
//! A consent's `revoked` flag moves false → true exactly once and never back.
//! The `RevocationEvent` written with that transition is immutable and hashed
//! under its own lineage, distinct from the consent's creation hash.

use serde::{Deserialize, Serialize};
use shared_crypto::{
    CanonicalSubject, ConsentFields, ContentHash, CryptoError, HashEngine, RevocationFields,
};
use shared_types::{new_id, ConsentId, EventId, Timestamp};
use std::collections::BTreeSet;
use std::time::Duration;

/// Longest consent validity accepted at grant time (100 years).
pub const MAX_CONSENT_DURATION_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Request to grant data-sharing consent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentGrant {
    /// DID of the patient granting consent.
    pub subject_did: String,
    /// Party receiving access.
    pub requester: String,
    /// Data categories covered.
    pub data_types: BTreeSet<String>,
    /// Validity period.
    pub duration: Duration,
}

impl ConsentGrant {
    /// Builds a grant request.
    pub fn new<I, S>(
        subject_did: impl Into<String>,
        requester: impl Into<String>,
        data_types: I,
        duration: Duration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject_did: subject_did.into(),
            requester: requester.into(),
            data_types: data_types.into_iter().map(Into::into).collect(),
            duration,
        }
    }

    /// Checks the request and returns the duration in whole seconds.
    pub fn validate(&self) -> Result<i64, String> {
        if self.subject_did.trim().is_empty() {
            return Err("subject_did is empty".into());
        }
        if self.requester.trim().is_empty() {
            return Err("requester is empty".into());
        }
        if self.data_types.is_empty() {
            return Err("data_types is empty".into());
        }
        let secs = i64::try_from(self.duration.as_secs()).unwrap_or(i64::MAX);
        if secs <= 0 {
            return Err("duration must be at least one second".into());
        }
        if secs > MAX_CONSENT_DURATION_SECS {
            return Err(format!("duration exceeds {MAX_CONSENT_DURATION_SECS}s"));
        }
        Ok(secs)
    }
}

/// A patient's data-sharing authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Primary key.
    pub id: ConsentId,
    /// DID of the granting patient.
    pub subject_did: String,
    /// Party receiving access.
    pub requester: String,
    /// Data categories covered.
    pub data_types: BTreeSet<String>,
    /// Validity in seconds from `created_at`.
    pub duration_secs: i64,
    /// Grant time.
    pub created_at: Timestamp,
    /// Hash of the grant.
    pub creation_hash: ContentHash,
    /// Set once, never cleared.
    pub revoked: bool,
    /// Time of revocation.
    pub revoked_at: Option<Timestamp>,
}

impl ConsentRecord {
    /// Creates an active consent and computes its creation hash.
    pub fn new(
        subject_did: String,
        requester: String,
        data_types: BTreeSet<String>,
        duration_secs: i64,
        now: Timestamp,
    ) -> Result<Self, CryptoError> {
        let id = new_id();
        let creation_hash = HashEngine::digest_subject(&CanonicalSubject::Consent(ConsentFields {
            consent_id: id.to_string(),
            subject_did: subject_did.clone(),
            requester: requester.clone(),
            data_types: data_types.clone(),
            duration_secs,
            created_at: now,
        }))?;
        Ok(Self {
            id,
            subject_did,
            requester,
            data_types,
            duration_secs,
            created_at: now,
            creation_hash,
            revoked: false,
            revoked_at: None,
        })
    }

    /// Canonical grant fields.
    pub fn canonical_subject(&self) -> CanonicalSubject {
        CanonicalSubject::Consent(ConsentFields {
            consent_id: self.id.to_string(),
            subject_did: self.subject_did.clone(),
            requester: self.requester.clone(),
            data_types: self.data_types.clone(),
            duration_secs: self.duration_secs,
            created_at: self.created_at,
        })
    }

    /// Recomputes the creation hash and compares it with the stored one.
    pub fn verify_creation_hash(&self) -> bool {
        HashEngine::verify(&self.canonical_subject(), &self.creation_hash)
    }

    /// End of validity.
    pub fn expires_at(&self) -> Timestamp {
        let secs = self.duration_secs.clamp(0, MAX_CONSENT_DURATION_SECS);
        self.created_at + chrono::Duration::seconds(secs)
    }

    /// Not revoked and not expired.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.revoked && now < self.expires_at()
    }

    /// Applies the one-way revocation transition.
    ///
    /// Returns false (and changes nothing) if already revoked.
    pub fn mark_revoked(&mut self, at: Timestamp) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revoked_at = Some(at);
        true
    }
}

/// Immutable record of a consent withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEvent {
    /// Primary key.
    pub id: EventId,
    /// Revoked consent.
    pub consent_id: ConsentId,
    /// Revoking party.
    pub revoked_by: String,
    /// Optional reason.
    pub reason: Option<String>,
    /// Revocation time.
    pub revoked_at: Timestamp,
    /// Hash over `(consent_id, revoked_by, reason, revoked_at)`.
    pub event_hash: ContentHash,
}

impl RevocationEvent {
    /// Creates an event and computes its hash.
    pub fn new(
        consent_id: ConsentId,
        revoked_by: String,
        reason: Option<String>,
        revoked_at: Timestamp,
    ) -> Result<Self, CryptoError> {
        let subject = revocation_subject(&consent_id, &revoked_by, reason.as_deref(), revoked_at);
        let event_hash = HashEngine::digest_subject(&subject)?;
        Ok(Self {
            id: new_id(),
            consent_id,
            revoked_by,
            reason,
            revoked_at,
            event_hash,
        })
    }

    /// Canonical revocation fields.
    pub fn canonical_subject(&self) -> CanonicalSubject {
        revocation_subject(
            &self.consent_id,
            &self.revoked_by,
            self.reason.as_deref(),
            self.revoked_at,
        )
    }

    /// Recomputes the event hash and compares it with the stored one.
    pub fn verify_event_hash(&self) -> bool {
        HashEngine::verify(&self.canonical_subject(), &self.event_hash)
    }
}

fn revocation_subject(
    consent_id: &ConsentId,
    revoked_by: &str,
    reason: Option<&str>,
    revoked_at: Timestamp,
) -> CanonicalSubject {
    CanonicalSubject::Revocation(RevocationFields {
        consent_id: consent_id.to_string(),
        revoked_by: revoked_by.to_string(),
        reason: reason.map(str::to_string),
        revoked_at,
    })
}
