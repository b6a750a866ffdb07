use super::domain::{ContractorId, ContractorStats, InvitationStatus};
use super::repository::{InvitationRepository, RepositoryError};

/// Maintains contractor-level counters. `total_invitations` and
/// `total_customers` move by commutative increments on the write paths;
/// the claim rate is reconciled here by full recount, which self-heals any
/// drift increments would accumulate under concurrent claims and sweeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAggregator;

impl StatsAggregator {
    /// Recounts the contractor's mirror set and writes the refreshed rate
    /// back. Idempotent with respect to the invitation set at the time it
    /// runs; the result is always within `[0, 1]`.
    pub fn recalculate_claim_rate(
        repository: &dyn InvitationRepository,
        contractor: &ContractorId,
    ) -> Result<ContractorStats, RepositoryError> {
        let mirrors = repository.mirrors_for(contractor)?;
        let total = mirrors.len();
        let claimed = mirrors
            .iter()
            .filter(|mirror| mirror.status == InvitationStatus::Claimed)
            .count();

        let claim_rate = if total == 0 {
            0.0
        } else {
            claimed as f32 / total as f32
        };

        let mut stats = repository.contractor_stats(contractor)?;
        stats.claim_rate = claim_rate;
        repository.put_contractor_stats(contractor, stats)?;

        Ok(stats)
    }
}
