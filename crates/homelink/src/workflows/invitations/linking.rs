use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{ContractorId, ContractorInvitationRecord, InvitationStatus};
use super::repository::{InvitationRepository, LinkWrite, RepositoryError};
use super::stats::StatsAggregator;
use super::validation::ClaimPolicy;

/// Counts reported back from one migration sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrationOutcome {
    /// Invitations newly linked to the contractor account.
    pub migrated_count: usize,
    /// Of those, how many had already been claimed pre-link.
    pub claimed_count: usize,
}

/// Migrates invitations created before the contractor had an account
/// (matched by contractor email, `contractor_id` unset) into that account
/// once they sign up or in.
///
/// The sweep is idempotent: linked invitations drop out of the match query,
/// so a failed or repeated run only ever touches the remainder.
#[derive(Debug, Clone)]
pub struct AccountLinker {
    policy: ClaimPolicy,
}

impl AccountLinker {
    pub fn with_policy(policy: ClaimPolicy) -> Self {
        Self { policy }
    }

    pub fn migrate(
        &self,
        repository: &dyn InvitationRepository,
        contractor: &ContractorId,
        contractor_email: &str,
        now: DateTime<Utc>,
    ) -> Result<MigrationOutcome, RepositoryError> {
        let orphans = repository.unlinked_for_email(contractor_email)?;
        if orphans.is_empty() {
            return Ok(MigrationOutcome::default());
        }

        let writes: Vec<LinkWrite> = orphans
            .iter()
            .map(|invitation| LinkWrite {
                invitation_id: invitation.id.clone(),
                contractor_id: contractor.clone(),
                linked_at: now,
                mirror: ContractorInvitationRecord::seeded_from(invitation, now),
            })
            .collect();

        // Chunked to respect the store's per-batch mutation ceiling. Chunks
        // are independent; on failure the applied prefix stays linked and the
        // remainder is picked up by the next sweep.
        let mut migrated = 0usize;
        let mut claimed = 0usize;
        let mut failure = None;
        for chunk in writes.chunks(self.policy.link_batch_size()) {
            match repository.apply_link_chunk(chunk) {
                Ok(()) => {
                    migrated += chunk.len();
                    claimed += chunk
                        .iter()
                        .filter(|write| write.mirror.status == InvitationStatus::Claimed)
                        .count();
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if migrated > 0 {
            let mut stats = repository.contractor_stats(contractor)?;
            stats.total_invitations += migrated as u32;
            stats.total_customers += claimed as u32;
            repository.put_contractor_stats(contractor, stats)?;
            StatsAggregator::recalculate_claim_rate(repository, contractor)?;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(MigrationOutcome {
                migrated_count: migrated,
                claimed_count: claimed,
            }),
        }
    }

    /// Best-effort variant for the post-authentication trigger: any failure
    /// is logged and discarded so sign-in is never blocked. Unlinked
    /// invitations simply wait for the next successful sweep.
    pub fn migrate_quietly(
        &self,
        repository: &dyn InvitationRepository,
        contractor: &ContractorId,
        contractor_email: &str,
        now: DateTime<Utc>,
    ) -> MigrationOutcome {
        match self.migrate(repository, contractor, contractor_email, now) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    contractor = %contractor.0,
                    error = %err,
                    "invitation linking sweep failed; will retry on next sign-in"
                );
                MigrationOutcome::default()
            }
        }
    }
}
