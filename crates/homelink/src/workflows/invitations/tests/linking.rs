use std::sync::Arc;

use chrono::Duration;

use super::common::{
    build_service, now, policy, session, unlinked_invitation, MemoryHomeGraph,
    UnavailableHomeGraph,
};
use crate::workflows::invitations::claim::ClaimRequest;
use crate::workflows::invitations::domain::{
    ClaimantId, ContractorId, InvitationId, InvitationStatus,
};
use crate::workflows::invitations::service::InvitationService;
use crate::workflows::invitations::validation::ClaimPolicy;

const EMAIL: &str = "pat@handyworks.example";

fn contractor() -> ContractorId {
    ContractorId("contractor-new".to_string())
}

#[test]
fn migrate_links_orphans_and_seeds_mirrors() {
    let (service, graph) = build_service();
    graph.seed(unlinked_invitation("inv-a", "tok-a", EMAIL));
    graph.seed(unlinked_invitation("inv-b", "tok-b", EMAIL));
    let mut claimed = unlinked_invitation("inv-c", "tok-c", EMAIL);
    claimed.status = InvitationStatus::Claimed;
    claimed.claimed_at = Some(now() - Duration::days(1));
    claimed.claimed_by = Some(ClaimantId("claimant-9".to_string()));
    graph.seed(claimed);
    graph.seed(unlinked_invitation("inv-other", "tok-other", "someone@else.example"));

    let outcome = service.migrate(&contractor(), EMAIL, now()).expect("migrate");
    assert_eq!(outcome.migrated_count, 3);
    assert_eq!(outcome.claimed_count, 1);

    for id in ["inv-a", "inv-b", "inv-c"] {
        let stored = graph
            .invitation(&InvitationId(id.to_string()))
            .expect("invitation present");
        assert_eq!(stored.contractor_id, Some(contractor()));
        assert_eq!(stored.linked_at, Some(now()));
    }
    let untouched = graph
        .invitation(&InvitationId("inv-other".to_string()))
        .expect("invitation present");
    assert!(untouched.contractor_id.is_none());

    let dashboard = service.contractor_dashboard(&contractor()).expect("dashboard");
    assert_eq!(dashboard.invitations.len(), 3);
    let claimed_mirror = dashboard
        .invitations
        .iter()
        .find(|mirror| mirror.id == InvitationId("inv-c".to_string()))
        .expect("claimed mirror seeded");
    assert_eq!(claimed_mirror.status, InvitationStatus::Claimed);
    assert_eq!(
        claimed_mirror.claimed_by,
        Some(ClaimantId("claimant-9".to_string()))
    );

    assert_eq!(dashboard.stats.total_invitations, 3);
    assert_eq!(dashboard.stats.total_customers, 1);
    assert!((dashboard.stats.claim_rate - 1.0 / 3.0).abs() < f32::EPSILON);
}

#[test]
fn migrate_twice_is_a_zero_op_with_identical_stats() {
    let (service, graph) = build_service();
    graph.seed(unlinked_invitation("inv-a", "tok-a", EMAIL));
    graph.seed(unlinked_invitation("inv-b", "tok-b", EMAIL));

    let first = service.migrate(&contractor(), EMAIL, now()).expect("migrate");
    assert_eq!(first.migrated_count, 2);
    let stats_after_first = service
        .contractor_dashboard(&contractor())
        .expect("dashboard")
        .stats;

    let second = service
        .migrate(&contractor(), EMAIL, now() + Duration::hours(1))
        .expect("migrate again");
    assert_eq!(second.migrated_count, 0);
    assert_eq!(second.claimed_count, 0);

    let stats_after_second = service
        .contractor_dashboard(&contractor())
        .expect("dashboard")
        .stats;
    assert_eq!(stats_after_first, stats_after_second);
}

#[test]
fn migrate_matches_email_case_insensitively() {
    let (service, graph) = build_service();
    graph.seed(unlinked_invitation("inv-a", "tok-a", EMAIL));

    let outcome = service
        .migrate(&contractor(), "Pat@HandyWorks.example", now())
        .expect("migrate");
    assert_eq!(outcome.migrated_count, 1);
}

#[test]
fn migrate_chunks_large_sweeps() {
    let graph = Arc::new(MemoryHomeGraph::default());
    let service = InvitationService::new(
        graph.clone(),
        graph.clone(),
        ClaimPolicy::new(30, 5, 2),
    );
    for index in 0..5 {
        graph.seed(unlinked_invitation(
            &format!("inv-{index}"),
            &format!("tok-{index}"),
            EMAIL,
        ));
    }

    let outcome = service.migrate(&contractor(), EMAIL, now()).expect("migrate");
    assert_eq!(outcome.migrated_count, 5);

    let dashboard = service.contractor_dashboard(&contractor()).expect("dashboard");
    assert_eq!(dashboard.stats.total_invitations, 5);
}

#[test]
fn quiet_migration_swallows_store_failures() {
    let graph = Arc::new(MemoryHomeGraph::default());
    let service = InvitationService::new(Arc::new(UnavailableHomeGraph), graph, policy());

    let outcome = service.migrate_quietly(&contractor(), EMAIL, now());
    assert_eq!(outcome.migrated_count, 0);
    assert_eq!(outcome.claimed_count, 0);
}

#[test]
fn claim_after_migration_counts_toward_the_linked_contractor() {
    let (service, graph) = build_service();
    graph.seed(unlinked_invitation("inv-a", "tok-a", EMAIL));
    service.migrate(&contractor(), EMAIL, now()).expect("migrate");

    let session = session("claimant-1", "jordan@example.com");
    let property = {
        use crate::workflows::invitations::repository::PropertyRepository;
        graph
            .create_property(&session.claimant_id, "Maple Street House")
            .expect("property created")
    };
    let outcome = service
        .claim(ClaimRequest {
            invitation_id: InvitationId("inv-a".to_string()),
            session,
            destination: property.id,
            now: now() + Duration::hours(1),
        })
        .expect("claim commits");
    assert!(matches!(
        outcome,
        crate::workflows::invitations::claim::ClaimOutcome::Completed(_)
    ));

    let stats = service.recalculate_claim_rate(&contractor()).expect("recount");
    assert_eq!(stats.total_customers, 1);
    assert!((stats.claim_rate - 1.0).abs() < f32::EPSILON);
}
