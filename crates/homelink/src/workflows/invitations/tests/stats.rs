use super::common::{build_service, invitation, now, unlinked_invitation};
use crate::workflows::invitations::domain::{ContractorId, ContractorStats, InvitationStatus};
use crate::workflows::invitations::repository::InvitationRepository;
use crate::workflows::invitations::stats::StatsAggregator;

fn contractor() -> ContractorId {
    ContractorId("contractor-1".to_string())
}

#[test]
fn recount_with_no_mirrors_yields_zero_rate() {
    let (_, graph) = build_service();
    let stats =
        StatsAggregator::recalculate_claim_rate(graph.as_ref(), &contractor()).expect("recount");
    assert_eq!(stats.claim_rate, 0.0);
}

#[test]
fn recount_matches_claimed_over_total() {
    let (_, graph) = build_service();
    graph.seed(invitation("inv-1", "tok-1"));
    let mut claimed = invitation("inv-2", "tok-2");
    claimed.status = InvitationStatus::Claimed;
    claimed.claimed_at = Some(now());
    graph.seed(claimed);
    let mut also_claimed = invitation("inv-3", "tok-3");
    also_claimed.status = InvitationStatus::Claimed;
    also_claimed.claimed_at = Some(now());
    graph.seed(also_claimed);
    graph.seed(invitation("inv-4", "tok-4"));

    let stats =
        StatsAggregator::recalculate_claim_rate(graph.as_ref(), &contractor()).expect("recount");
    assert!((stats.claim_rate - 0.5).abs() < f32::EPSILON);
    assert!(stats.claim_rate >= 0.0 && stats.claim_rate <= 1.0);
}

#[test]
fn recount_heals_a_drifted_rate() {
    let (_, graph) = build_service();
    graph.seed(invitation("inv-1", "tok-1"));
    graph
        .put_contractor_stats(
            &contractor(),
            ContractorStats {
                total_invitations: 1,
                total_customers: 0,
                claim_rate: 0.9,
            },
        )
        .expect("stats written");

    let stats =
        StatsAggregator::recalculate_claim_rate(graph.as_ref(), &contractor()).expect("recount");
    assert_eq!(stats.claim_rate, 0.0);
    assert_eq!(stats.total_invitations, 1);
}

#[test]
fn recount_ignores_unlinked_invitations() {
    let (_, graph) = build_service();
    graph.seed(invitation("inv-1", "tok-1"));
    graph.seed(unlinked_invitation("inv-orphan", "tok-orphan", "solo@pro.example"));

    let stats =
        StatsAggregator::recalculate_claim_rate(graph.as_ref(), &contractor()).expect("recount");
    assert_eq!(stats.claim_rate, 0.0);

    let mirrors = graph.mirrors_for(&contractor()).expect("mirrors");
    assert_eq!(mirrors.len(), 1);
}
