use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ClaimantId, ContractorId, ContractorInvitationRecord, ContractorStats, Invitation,
    InvitationId, InventoryItem, PropertyId, PropertySummary,
};

/// Everything one successful claim writes, committed as a unit.
///
/// The orchestrator builds the set from its own read of the invitation;
/// records are immutable after creation, so prebuilt inventory entries stay
/// valid even if the commit happens later than the read.
#[derive(Debug, Clone)]
pub struct ClaimWriteSet {
    pub invitation_id: InvitationId,
    pub claimed_by: ClaimantId,
    pub claimed_at: DateTime<Utc>,
    pub destination: PropertyId,
    pub items: Vec<InventoryItem>,
    /// Absent when the invitation has not been linked to a contractor
    /// account yet; the linking sweep backfills the contractor side later.
    pub customer: Option<CustomerUpsert>,
}

/// Declarative create-or-increment for the contractor's CRM entry, applied
/// inside the claim transaction so the deltas commute under concurrency.
#[derive(Debug, Clone)]
pub struct CustomerUpsert {
    pub contractor_id: ContractorId,
    pub claimant_id: ClaimantId,
    pub customer_name: String,
    pub property_name: String,
    pub job_increment: u32,
    pub spend_delta_cents: u64,
    pub last_contact: DateTime<Utc>,
}

/// Result of a committed claim transaction.
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub invitation: Invitation,
    /// Inventory entries actually created; replayed imports are skipped via
    /// the source-invitation tag.
    pub imported_count: usize,
    pub customer_created: bool,
}

/// One invitation's share of a migration chunk: attach the orphan to the
/// contractor account and seed its dashboard mirror.
#[derive(Debug, Clone)]
pub struct LinkWrite {
    pub invitation_id: InvitationId,
    pub contractor_id: ContractorId,
    pub linked_at: DateTime<Utc>,
    pub mirror: ContractorInvitationRecord,
}

/// Contractor-facing read model: mirrors plus the aggregate stats block,
/// never a cross-account query.
#[derive(Debug, Clone, Serialize)]
pub struct ContractorDashboard {
    pub invitations: Vec<ContractorInvitationRecord>,
    pub stats: ContractorStats,
}

/// Storage abstraction over the invitation graph. Implementations back onto
/// any transactional document store; [`super::memory::MemoryHomeGraph`] is
/// the in-memory reference.
pub trait InvitationRepository: Send + Sync {
    /// Global token index, readable without authentication.
    fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, RepositoryError>;

    fn fetch(&self, id: &InvitationId) -> Result<Option<Invitation>, RepositoryError>;

    /// Global email index over invitations with no contractor account yet.
    /// Matches case-insensitively against the stored (lowercased) address.
    fn unlinked_for_email(&self, contractor_email: &str)
        -> Result<Vec<Invitation>, RepositoryError>;

    /// The single atomic read-then-write-set operation behind a claim.
    ///
    /// Contract: re-read the invitation under the transaction and refuse the
    /// whole set with [`RepositoryError::ClaimGuard`] unless its status is
    /// still `Pending`. That fresh read is the sole concurrency guard and
    /// makes the claim at-most-once; no partial application is permitted.
    fn commit_claim(&self, set: ClaimWriteSet) -> Result<ClaimReceipt, RepositoryError>;

    /// Applies one bounded chunk of the linking sweep. All writes in a chunk
    /// land together; chunks carry no dependency on each other. Invitations
    /// already linked are skipped rather than overwritten.
    fn apply_link_chunk(&self, chunk: &[LinkWrite]) -> Result<(), RepositoryError>;

    fn mirrors_for(
        &self,
        contractor: &ContractorId,
    ) -> Result<Vec<ContractorInvitationRecord>, RepositoryError>;

    fn contractor_stats(&self, contractor: &ContractorId)
        -> Result<ContractorStats, RepositoryError>;

    fn put_contractor_stats(
        &self,
        contractor: &ContractorId,
        stats: ContractorStats,
    ) -> Result<(), RepositoryError>;

    /// Ids of pending invitations created before `cutoff`, fed to the expiry
    /// sweep.
    fn pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InvitationId>, RepositoryError>;

    /// Persists read-time expiry, mirror included when the invitation is
    /// linked. Only applies over `Pending`; anything else fails the guard so
    /// terminal states are never rewritten.
    fn mark_expired(&self, id: &InvitationId) -> Result<(), RepositoryError>;

    /// Creation write path. For invitations carrying a contractor account
    /// this also seeds the dashboard mirror and bumps `total_invitations`;
    /// the mirror is never writable on its own.
    fn insert(&self, invitation: Invitation) -> Result<Invitation, RepositoryError>;
}

/// Storage abstraction over claimant-owned destinations and their inventory.
pub trait PropertyRepository: Send + Sync {
    fn properties_for(&self, claimant: &ClaimantId)
        -> Result<Vec<PropertySummary>, RepositoryError>;

    fn create_property(
        &self,
        claimant: &ClaimantId,
        name: &str,
    ) -> Result<PropertySummary, RepositoryError>;

    fn find_property(
        &self,
        claimant: &ClaimantId,
        property: &PropertyId,
    ) -> Result<Option<PropertySummary>, RepositoryError>;

    fn inventory_for(
        &self,
        claimant: &ClaimantId,
        property: &PropertyId,
    ) -> Result<Vec<InventoryItem>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("invitation is no longer pending")]
    ClaimGuard,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Transient failures are retryable by the caller; everything else is a
    /// terminal answer about the data.
    pub const fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}
