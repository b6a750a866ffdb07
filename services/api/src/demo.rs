use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;

use homelink::config::ClaimPolicyConfig;
use homelink::error::AppError;
use homelink::workflows::invitations::{
    AuthSession, ClaimFlow, ClaimFlowEvent, ClaimFlowState, ClaimOutcome, ClaimRequest,
    ClaimantId, ContractorId, ImportRecord, Invitation, InvitationId, InvitationStatus,
    MemoryHomeGraph, NewInvitation, PropertyRepository, RecordCategory,
};

use crate::infra::{build_service, HomeGraphService};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lock the demo invitation to this recipient address
    #[arg(long)]
    pub(crate) recipient_email: Option<String>,
    /// Skip the account-linking portion of the demo
    #[arg(long)]
    pub(crate) skip_linking: bool,
}

fn demo_records() -> Vec<ImportRecord> {
    vec![
        ImportRecord {
            name: "Tankless water heater".to_string(),
            category: RecordCategory::Plumbing,
            brand: Some("Navien".to_string()),
            model: Some("NPE-240A2".to_string()),
            cost_cents: 310_000,
            maintenance_hints: vec!["Descale annually".to_string()],
        },
        ImportRecord {
            name: "Heat pump".to_string(),
            category: RecordCategory::Hvac,
            brand: Some("Mitsubishi".to_string()),
            model: None,
            cost_cents: 820_000,
            maintenance_hints: vec!["Clean filters quarterly".to_string()],
        },
        ImportRecord {
            name: "Smoke detectors".to_string(),
            category: RecordCategory::Electrical,
            brand: None,
            model: None,
            cost_cents: 18_000,
            maintenance_hints: vec!["Test monthly".to_string()],
        },
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        recipient_email,
        skip_linking,
    } = args;

    let (service, graph) = build_service(&ClaimPolicyConfig::default());

    println!("HomeLink invitation demo");

    let contractor = ContractorId("contractor-demo".to_string());
    let invitation = service.create_invitation(
        NewInvitation {
            contractor_id: Some(contractor.clone()),
            contractor_email: "pros@allseasons.example".to_string(),
            contractor_name: "All Seasons Home Services".to_string(),
            recipient_email: recipient_email.clone(),
            records: demo_records(),
        },
        Utc::now(),
    )?;
    println!(
        "\nInvitation created: id {}, claim token {}",
        invitation.id.0, invitation.claim_token
    );

    let session = AuthSession {
        claimant_id: ClaimantId("homeowner-demo".to_string()),
        email: recipient_email.unwrap_or_else(|| "jordan@example.com".to_string()),
        display_name: "Jordan Avery".to_string(),
    };

    run_claim_flow(&service, &graph, &invitation, session)?;

    replay_claim(&service, &graph, &invitation.id)?;

    if !skip_linking {
        run_linking_sweep(&service, &graph)?;
    }

    render_dashboard(&service, &contractor)?;

    Ok(())
}

fn run_claim_flow(
    service: &Arc<HomeGraphService>,
    graph: &Arc<MemoryHomeGraph>,
    invitation: &Invitation,
    session: AuthSession,
) -> Result<(), AppError> {
    println!("\nClaim flow");

    let validation = service.validate(&invitation.claim_token, Utc::now())?;
    let mut flow = ClaimFlow::from_validation(validation);

    if let ClaimFlowState::Preview { preview } = flow.state() {
        println!(
            "- preview: {} records from {}, declared value ${:.2}",
            preview.record_count,
            preview.contractor_name,
            preview.total_value_cents as f64 / 100.0
        );
    }

    flow.apply(ClaimFlowEvent::AcceptedSignedOut);
    println!("- accepted; authenticating as {}", session.email);

    let email_match = service.check_email(&invitation.id, &session.email)?;
    flow.apply(ClaimFlowEvent::Authenticated {
        session: session.clone(),
        email_match,
    });
    if let ClaimFlowState::Failed { reason } = flow.state() {
        println!("- flow ended: {}", reason.code());
        return Ok(());
    }

    let properties = graph.properties_for(&session.claimant_id)?;
    flow.apply(ClaimFlowEvent::PropertiesLoaded {
        properties: properties.clone(),
    });
    let destination = if properties.is_empty() {
        let property = graph.create_property(&session.claimant_id, "My Home")?;
        println!("- no destination on file; created '{}'", property.name);
        flow.apply(ClaimFlowEvent::DestinationCreated {
            property: property.clone(),
        });
        property
    } else {
        let property = properties[0].clone();
        flow.apply(ClaimFlowEvent::DestinationChosen {
            property: property.id.clone(),
        });
        property
    };

    flow.apply(ClaimFlowEvent::ConfirmImport);

    let outcome = service.claim(ClaimRequest {
        invitation_id: invitation.id.clone(),
        session: session.clone(),
        destination: destination.id.clone(),
        now: Utc::now(),
    })?;
    match outcome {
        ClaimOutcome::Completed(completion) => {
            flow.apply(ClaimFlowEvent::ImportCompleted {
                imported_count: completion.imported_count,
                contractor_name: completion.contractor.name.clone(),
            });
            println!(
                "- imported {} records from {} into '{}'",
                completion.imported_count, completion.contractor.name, destination.name
            );
        }
        ClaimOutcome::Denied(reason) => {
            flow.apply(ClaimFlowEvent::ImportDenied { reason });
            println!("- claim denied: {}", reason.code());
        }
    }

    let inventory = graph.inventory_for(&session.claimant_id, &destination.id)?;
    println!(
        "- home profile now holds {} imported entries",
        inventory.len()
    );

    Ok(())
}

fn replay_claim(
    service: &Arc<HomeGraphService>,
    graph: &Arc<MemoryHomeGraph>,
    invitation_id: &InvitationId,
) -> Result<(), AppError> {
    println!("\nReplay protection");

    let replay = service.claim(ClaimRequest {
        invitation_id: invitation_id.clone(),
        session: AuthSession {
            claimant_id: ClaimantId("second-tab".to_string()),
            email: "jordan@example.com".to_string(),
            display_name: "Jordan Avery".to_string(),
        },
        destination: graph
            .create_property(&ClaimantId("second-tab".to_string()), "Second Tab House")?
            .id,
        now: Utc::now(),
    })?;
    match replay {
        ClaimOutcome::Denied(reason) => {
            println!("- duplicate claim attempt rejected: {}", reason.code())
        }
        ClaimOutcome::Completed(_) => println!("- unexpected: duplicate claim succeeded"),
    }

    Ok(())
}

fn run_linking_sweep(
    service: &Arc<HomeGraphService>,
    graph: &Arc<MemoryHomeGraph>,
) -> Result<(), AppError> {
    println!("\nAccount linking");

    let email = "pat@handyworks.example";
    for index in 0..3 {
        let mut orphan = Invitation {
            id: InvitationId(format!("orphan-{index}")),
            claim_token: format!("orphan-token-{index}"),
            contractor_id: None,
            contractor_email: email.to_string(),
            contractor_name: "Handy Works".to_string(),
            recipient_email: None,
            status: InvitationStatus::Pending,
            records: demo_records(),
            created_at: Utc::now() - Duration::days(3),
            claimed_at: None,
            claimed_by: None,
            linked_at: None,
        };
        if index == 0 {
            orphan.status = InvitationStatus::Claimed;
            orphan.claimed_at = Some(Utc::now() - Duration::days(1));
            orphan.claimed_by = Some(ClaimantId("early-customer".to_string()));
        }
        graph.seed(orphan);
    }
    println!("- seeded 3 invitations sent before Handy Works had an account");

    let contractor = ContractorId("contractor-handyworks".to_string());
    let outcome = service.migrate_quietly(&contractor, email, Utc::now());
    println!(
        "- sweep linked {} invitations ({} already claimed)",
        outcome.migrated_count, outcome.claimed_count
    );

    let repeat = service.migrate_quietly(&contractor, email, Utc::now());
    println!(
        "- repeat sweep linked {} invitations (idempotent)",
        repeat.migrated_count
    );

    render_dashboard(service, &contractor)?;
    Ok(())
}

fn render_dashboard(
    service: &Arc<HomeGraphService>,
    contractor: &ContractorId,
) -> Result<(), AppError> {
    service.recalculate_claim_rate(contractor)?;
    let dashboard = service.contractor_dashboard(contractor)?;

    println!("\nDashboard for {}", contractor.0);
    for mirror in &dashboard.invitations {
        let customer = mirror
            .customer_name
            .as_deref()
            .map(|name| format!(" by {name}"))
            .unwrap_or_default();
        println!(
            "- {} | {} records | {}{}",
            mirror.id.0,
            mirror.record_count,
            mirror.status.label(),
            customer
        );
    }
    println!(
        "Totals: {} invitations, {} customers, claim rate {:.0}%",
        dashboard.stats.total_invitations,
        dashboard.stats.total_customers,
        dashboard.stats.claim_rate * 100.0
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs::default()).expect("demo completes");
    }

    #[test]
    fn demo_respects_a_recipient_lock() {
        run_demo(DemoArgs {
            recipient_email: Some("jordan@example.com".to_string()),
            skip_linking: true,
        })
        .expect("demo completes with lock");
    }
}
