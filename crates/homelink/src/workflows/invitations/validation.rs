use chrono::{DateTime, Duration, Utc};

use crate::config::ClaimPolicyConfig;

use super::domain::{DenialReason, Invitation, InvitationPreview, InvitationStatus};
use super::repository::{InvitationRepository, RepositoryError};

const DEFAULT_VALIDITY_DAYS: i64 = 30;
const DEFAULT_PREVIEW_CAP: usize = 5;
const DEFAULT_LINK_BATCH_SIZE: usize = 400;

/// Policy dial backing the claim protocol: how long tokens stay valid, how
/// much of the payload the anonymous preview reveals, and how large a
/// migration chunk may grow.
#[derive(Debug, Clone)]
pub struct ClaimPolicy {
    validity_days: i64,
    preview_cap: usize,
    link_batch_size: usize,
}

impl ClaimPolicy {
    pub fn new(validity_days: i64, preview_cap: usize, link_batch_size: usize) -> Self {
        let validity_days = if validity_days > 0 {
            validity_days
        } else {
            DEFAULT_VALIDITY_DAYS
        };
        let link_batch_size = if link_batch_size > 0 {
            link_batch_size
        } else {
            DEFAULT_LINK_BATCH_SIZE
        };

        Self {
            validity_days,
            preview_cap,
            link_batch_size,
        }
    }

    pub fn validity_days(&self) -> i64 {
        self.validity_days
    }

    pub fn preview_cap(&self) -> usize {
        self.preview_cap
    }

    pub fn link_batch_size(&self) -> usize {
        self.link_batch_size
    }

    /// Read-time expiry check against the fixed validity window.
    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(created_at) > Duration::days(self.validity_days)
    }
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_VALIDITY_DAYS,
            DEFAULT_PREVIEW_CAP,
            DEFAULT_LINK_BATCH_SIZE,
        )
    }
}

impl From<&ClaimPolicyConfig> for ClaimPolicy {
    fn from(config: &ClaimPolicyConfig) -> Self {
        Self::new(
            config.validity_days,
            config.preview_cap,
            config.link_batch_size,
        )
    }
}

/// Outcome of resolving a claim token. `Usable` carries the preview
/// projection alongside the invitation so callers never reach back into the
/// store for display data.
#[derive(Debug, Clone)]
pub enum TokenValidation {
    Usable {
        invitation: Invitation,
        preview: InvitationPreview,
    },
    Unusable(DenialReason),
}

/// Resolves a claim token to an invitation and classifies its usability.
/// Validation is pure: repeated calls never write, expiry included — the
/// explicit sweep persists what this check observes.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    policy: ClaimPolicy,
}

impl TokenValidator {
    pub fn with_policy(policy: ClaimPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClaimPolicy {
        &self.policy
    }

    pub fn validate(
        &self,
        repository: &dyn InvitationRepository,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenValidation, RepositoryError> {
        let Some(invitation) = repository.find_by_token(token)? else {
            return Ok(TokenValidation::Unusable(DenialReason::NotFound));
        };

        let validation = match invitation.status {
            InvitationStatus::Claimed => TokenValidation::Unusable(DenialReason::AlreadyClaimed),
            InvitationStatus::Expired => TokenValidation::Unusable(DenialReason::Expired),
            InvitationStatus::Pending
                if self.policy.is_expired(invitation.created_at, now) =>
            {
                TokenValidation::Unusable(DenialReason::Expired)
            }
            InvitationStatus::Pending => TokenValidation::Usable {
                preview: invitation.preview(self.policy.preview_cap),
                invitation,
            },
        };

        Ok(validation)
    }
}

/// Result of the recipient-email lock check. A mismatch deliberately carries
/// nothing: revealing the locked address would let a caller enumerate
/// recipient identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailMatch {
    Matches,
    Mismatch,
}

impl EmailMatch {
    pub const fn matches(self) -> bool {
        matches!(self, EmailMatch::Matches)
    }
}

/// Enforces optional recipient-email locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailGate;

impl EmailGate {
    pub fn check(invitation: &Invitation, authenticated_email: &str) -> EmailMatch {
        match invitation.recipient_email.as_deref() {
            None => EmailMatch::Matches,
            Some(locked) if locked.eq_ignore_ascii_case(authenticated_email.trim()) => {
                EmailMatch::Matches
            }
            Some(_) => EmailMatch::Mismatch,
        }
    }
}
