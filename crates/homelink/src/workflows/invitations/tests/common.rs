use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::invitations::domain::{
    AuthSession, ClaimantId, ContractorId, ContractorInvitationRecord, ContractorStats,
    ImportRecord, Invitation, InvitationId, InvitationStatus, NewInvitation, RecordCategory,
};
use crate::workflows::invitations::repository::{
    ClaimReceipt, ClaimWriteSet, InvitationRepository, LinkWrite, RepositoryError,
};
use crate::workflows::invitations::service::InvitationService;
use crate::workflows::invitations::validation::ClaimPolicy;

pub(super) use crate::workflows::invitations::memory::MemoryHomeGraph;

pub(super) fn policy() -> ClaimPolicy {
    ClaimPolicy::new(30, 5, 400)
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn records() -> Vec<ImportRecord> {
    vec![
        ImportRecord {
            name: "Water heater".to_string(),
            category: RecordCategory::Plumbing,
            brand: Some("Rheem".to_string()),
            model: Some("XE50T06".to_string()),
            cost_cents: 120_000,
            maintenance_hints: vec!["Flush tank annually".to_string()],
        },
        ImportRecord {
            name: "Furnace".to_string(),
            category: RecordCategory::Hvac,
            brand: Some("Carrier".to_string()),
            model: None,
            cost_cents: 340_000,
            maintenance_hints: vec!["Replace filter quarterly".to_string()],
        },
        ImportRecord {
            name: "Garage door opener".to_string(),
            category: RecordCategory::Other,
            brand: None,
            model: None,
            cost_cents: 45_000,
            maintenance_hints: Vec::new(),
        },
    ]
}

pub(super) fn invitation(id: &str, token: &str) -> Invitation {
    Invitation {
        id: InvitationId(id.to_string()),
        claim_token: token.to_string(),
        contractor_id: Some(ContractorId("contractor-1".to_string())),
        contractor_email: "pros@allseasons.example".to_string(),
        contractor_name: "All Seasons Home Services".to_string(),
        recipient_email: None,
        status: InvitationStatus::Pending,
        records: records(),
        created_at: now() - Duration::days(2),
        claimed_at: None,
        claimed_by: None,
        linked_at: None,
    }
}

pub(super) fn unlinked_invitation(id: &str, token: &str, email: &str) -> Invitation {
    Invitation {
        contractor_id: None,
        contractor_email: email.to_ascii_lowercase(),
        ..invitation(id, token)
    }
}

pub(super) fn session(claimant: &str, email: &str) -> AuthSession {
    AuthSession {
        claimant_id: ClaimantId(claimant.to_string()),
        email: email.to_string(),
        display_name: "Jordan Avery".to_string(),
    }
}

pub(super) fn draft() -> NewInvitation {
    NewInvitation {
        contractor_id: Some(ContractorId("contractor-1".to_string())),
        contractor_email: "Pros@AllSeasons.example".to_string(),
        contractor_name: "All Seasons Home Services".to_string(),
        recipient_email: None,
        records: records(),
    }
}

/// Failure-injection double: every call reports the store offline.
pub(super) struct UnavailableHomeGraph;

impl InvitationRepository for UnavailableHomeGraph {
    fn find_by_token(&self, _token: &str) -> Result<Option<Invitation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &InvitationId) -> Result<Option<Invitation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn unlinked_for_email(
        &self,
        _contractor_email: &str,
    ) -> Result<Vec<Invitation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_claim(&self, _set: ClaimWriteSet) -> Result<ClaimReceipt, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_link_chunk(&self, _chunk: &[LinkWrite]) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mirrors_for(
        &self,
        _contractor: &ContractorId,
    ) -> Result<Vec<ContractorInvitationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn contractor_stats(
        &self,
        _contractor: &ContractorId,
    ) -> Result<ContractorStats, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn put_contractor_stats(
        &self,
        _contractor: &ContractorId,
        _stats: ContractorStats,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending_created_before(
        &self,
        _cutoff: DateTime<Utc>,
    ) -> Result<Vec<InvitationId>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_expired(&self, _id: &InvitationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _invitation: Invitation) -> Result<Invitation, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    InvitationService<MemoryHomeGraph, MemoryHomeGraph>,
    Arc<MemoryHomeGraph>,
) {
    let graph = Arc::new(MemoryHomeGraph::default());
    let service = InvitationService::new(graph.clone(), graph.clone(), policy());
    (service, graph)
}
