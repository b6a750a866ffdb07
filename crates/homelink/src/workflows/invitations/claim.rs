use chrono::{DateTime, Utc};

use super::domain::{
    AuthSession, ContractorInfo, DenialReason, InvitationId, InventoryItem, PropertyId,
};
use super::repository::{
    ClaimWriteSet, CustomerUpsert, InvitationRepository, PropertyRepository, RepositoryError,
};
use super::validation::EmailGate;

/// Inputs for one claim attempt. The session is explicit so callers (and
/// tests) inject identity instead of reading ambient auth state.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub invitation_id: InvitationId,
    pub session: AuthSession,
    pub destination: PropertyId,
    pub now: DateTime<Utc>,
}

/// Typed claim result. Denials are answers, not errors; `Err` is reserved
/// for transient store failures the caller may retry.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Completed(ClaimCompletion),
    Denied(DenialReason),
}

/// Payload for the claimant's terminal screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCompletion {
    pub imported_count: usize,
    pub contractor: ContractorInfo,
}

/// Performs the atomic claim: flips the invitation, imports its records into
/// the claimant's destination, upserts the contractor's customer record, and
/// refreshes the dashboard mirror — all in one committed write set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimOrchestrator;

impl ClaimOrchestrator {
    pub fn claim(
        invitations: &dyn InvitationRepository,
        properties: &dyn PropertyRepository,
        request: ClaimRequest,
    ) -> Result<ClaimOutcome, RepositoryError> {
        let ClaimRequest {
            invitation_id,
            session,
            destination,
            now,
        } = request;

        let Some(invitation) = invitations.fetch(&invitation_id)? else {
            return Ok(ClaimOutcome::Denied(DenialReason::NotFound));
        };

        // Caller-side precondition only; the commit re-checks status under
        // the transaction, which is the guard that actually decides races.
        if !invitation.is_pending() {
            return Ok(ClaimOutcome::Denied(DenialReason::AlreadyClaimed));
        }

        if !EmailGate::check(&invitation, &session.email).matches() {
            return Ok(ClaimOutcome::Denied(DenialReason::EmailMismatch));
        }

        let Some(property) = properties.find_property(&session.claimant_id, &destination)? else {
            return Ok(ClaimOutcome::Denied(DenialReason::InvalidProperty));
        };

        let items: Vec<InventoryItem> = invitation
            .records
            .iter()
            .map(|record| InventoryItem {
                property_id: destination.clone(),
                name: record.name.clone(),
                category: record.category,
                brand: record.brand.clone(),
                model: record.model.clone(),
                cost_cents: record.cost_cents,
                maintenance_hints: record.maintenance_hints.clone(),
                source_invitation_id: Some(invitation.id.clone()),
                imported_at: now,
            })
            .collect();

        // Contractor-side writes only exist once the invitation is linked;
        // the migration sweep backfills mirrors for pre-link claims.
        let customer = invitation
            .contractor_id
            .clone()
            .map(|contractor_id| CustomerUpsert {
                contractor_id,
                claimant_id: session.claimant_id.clone(),
                customer_name: session.display_name.clone(),
                property_name: property.name.clone(),
                job_increment: 1,
                spend_delta_cents: invitation.total_value_cents(),
                last_contact: now,
            });

        let set = ClaimWriteSet {
            invitation_id: invitation.id.clone(),
            claimed_by: session.claimant_id,
            claimed_at: now,
            destination,
            items,
            customer,
        };

        match invitations.commit_claim(set) {
            Ok(receipt) => Ok(ClaimOutcome::Completed(ClaimCompletion {
                imported_count: receipt.imported_count,
                contractor: ContractorInfo {
                    name: receipt.invitation.contractor_name,
                },
            })),
            Err(RepositoryError::ClaimGuard) => {
                Ok(ClaimOutcome::Denied(DenialReason::AlreadyClaimed))
            }
            Err(other) => Err(other),
        }
    }
}
