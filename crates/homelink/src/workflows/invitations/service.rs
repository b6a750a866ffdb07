use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::claim::{ClaimOrchestrator, ClaimOutcome, ClaimRequest};
use super::domain::{
    ContractorId, ContractorStats, Invitation, InvitationId, InvitationStatus, NewInvitation,
};
use super::linking::{AccountLinker, MigrationOutcome};
use super::repository::{
    ContractorDashboard, InvitationRepository, PropertyRepository, RepositoryError,
};
use super::stats::StatsAggregator;
use super::validation::{ClaimPolicy, EmailGate, EmailMatch, TokenValidation, TokenValidator};

/// Facade composing the claim-protocol components over a pair of
/// repositories. The HTTP router, the CLI demo, and the tests all go through
/// this type.
pub struct InvitationService<R, P> {
    invitations: Arc<R>,
    properties: Arc<P>,
    validator: TokenValidator,
    linker: AccountLinker,
}

impl<R, P> InvitationService<R, P>
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    pub fn new(invitations: Arc<R>, properties: Arc<P>, policy: ClaimPolicy) -> Self {
        Self {
            invitations,
            properties,
            validator: TokenValidator::with_policy(policy.clone()),
            linker: AccountLinker::with_policy(policy),
        }
    }

    pub fn policy(&self) -> &ClaimPolicy {
        self.validator.policy()
    }

    pub fn invitations(&self) -> &Arc<R> {
        &self.invitations
    }

    pub fn properties(&self) -> &Arc<P> {
        &self.properties
    }

    /// Resolve a claim token. Pure read; safe for unauthenticated callers.
    pub fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenValidation, RepositoryError> {
        self.validator
            .validate(self.invitations.as_ref(), token, now)
    }

    /// Run the recipient-email lock against an authenticated address.
    pub fn check_email(
        &self,
        invitation_id: &InvitationId,
        authenticated_email: &str,
    ) -> Result<EmailMatch, RepositoryError> {
        let invitation = self
            .invitations
            .fetch(invitation_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(EmailGate::check(&invitation, authenticated_email))
    }

    /// Atomic claim; at-most-once per invitation regardless of retries.
    pub fn claim(&self, request: ClaimRequest) -> Result<ClaimOutcome, RepositoryError> {
        ClaimOrchestrator::claim(self.invitations.as_ref(), self.properties.as_ref(), request)
    }

    /// Linking sweep for invitations created before the contractor had an
    /// account.
    pub fn migrate(
        &self,
        contractor: &ContractorId,
        contractor_email: &str,
        now: DateTime<Utc>,
    ) -> Result<MigrationOutcome, RepositoryError> {
        self.linker
            .migrate(self.invitations.as_ref(), contractor, contractor_email, now)
    }

    /// Post-authentication trigger: never fails, never blocks sign-in.
    pub fn migrate_quietly(
        &self,
        contractor: &ContractorId,
        contractor_email: &str,
        now: DateTime<Utc>,
    ) -> MigrationOutcome {
        self.linker
            .migrate_quietly(self.invitations.as_ref(), contractor, contractor_email, now)
    }

    pub fn recalculate_claim_rate(
        &self,
        contractor: &ContractorId,
    ) -> Result<ContractorStats, RepositoryError> {
        StatsAggregator::recalculate_claim_rate(self.invitations.as_ref(), contractor)
    }

    /// Contractor read model: mirrors plus the stats block.
    pub fn contractor_dashboard(
        &self,
        contractor: &ContractorId,
    ) -> Result<ContractorDashboard, RepositoryError> {
        Ok(ContractorDashboard {
            invitations: self.invitations.mirrors_for(contractor)?,
            stats: self.invitations.contractor_stats(contractor)?,
        })
    }

    /// Mint and persist a new invitation from a contractor draft.
    pub fn create_invitation(
        &self,
        draft: NewInvitation,
        now: DateTime<Utc>,
    ) -> Result<Invitation, RepositoryError> {
        let invitation = Invitation {
            id: InvitationId(Uuid::new_v4().to_string()),
            claim_token: Uuid::new_v4().simple().to_string(),
            contractor_id: draft.contractor_id,
            contractor_email: draft.contractor_email.trim().to_ascii_lowercase(),
            contractor_name: draft.contractor_name,
            recipient_email: draft
                .recipient_email
                .map(|email| email.trim().to_ascii_lowercase()),
            status: InvitationStatus::Pending,
            records: draft.records,
            created_at: now,
            claimed_at: None,
            claimed_by: None,
            linked_at: None,
        };

        self.invitations.insert(invitation)
    }

    /// Persist read-time expiry for every pending invitation past the
    /// validity window. Invitations claimed while the sweep runs lose the
    /// guard and are skipped.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let cutoff = now - Duration::days(self.policy().validity_days());
        let stale = self.invitations.pending_created_before(cutoff)?;

        let mut expired = 0usize;
        for id in &stale {
            match self.invitations.mark_expired(id) {
                Ok(()) => expired += 1,
                Err(RepositoryError::ClaimGuard) => {}
                Err(other) => return Err(other),
            }
        }

        Ok(expired)
    }
}
