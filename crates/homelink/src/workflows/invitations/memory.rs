//! In-memory reference implementation of the storage traits.
//!
//! One mutex guards every collection, which makes the claim commit and the
//! link chunks transactional by construction. The api service runs on this
//! store until a document database is wired in, and the test suites share it
//! as their double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{
    ClaimantId, ContractorId, ContractorInvitationRecord, ContractorStats, Customer, Invitation,
    InvitationId, InvitationStatus, InventoryItem, PropertyId, PropertySummary,
};
use super::repository::{
    ClaimReceipt, ClaimWriteSet, InvitationRepository, LinkWrite, PropertyRepository,
    RepositoryError,
};

#[derive(Default)]
struct HomeGraphState {
    invitations: HashMap<InvitationId, Invitation>,
    mirrors: HashMap<ContractorId, HashMap<InvitationId, ContractorInvitationRecord>>,
    customers: HashMap<ContractorId, HashMap<ClaimantId, Customer>>,
    stats: HashMap<ContractorId, ContractorStats>,
    properties: HashMap<ClaimantId, Vec<PropertySummary>>,
    inventory: HashMap<(ClaimantId, PropertyId), Vec<InventoryItem>>,
}

#[derive(Default, Clone)]
pub struct MemoryHomeGraph {
    state: Arc<Mutex<HomeGraphState>>,
    property_sequence: Arc<AtomicU64>,
}

fn seed_locked(state: &mut HomeGraphState, invitation: Invitation) {
    if let Some(contractor) = invitation.contractor_id.clone() {
        let mirror = ContractorInvitationRecord {
            id: invitation.id.clone(),
            status: invitation.status,
            record_count: invitation.records.len(),
            created_at: invitation.created_at,
            claimed_at: invitation.claimed_at,
            claimed_by: invitation.claimed_by.clone(),
            customer_name: None,
            customer_property_name: None,
            linked_at: invitation.linked_at,
        };
        state
            .mirrors
            .entry(contractor.clone())
            .or_default()
            .insert(invitation.id.clone(), mirror);
        state.stats.entry(contractor).or_default().total_invitations += 1;
    }
    state.invitations.insert(invitation.id.clone(), invitation);
}

impl MemoryHomeGraph {
    /// Direct seeding for demos and tests: accepts any invitation state and
    /// maintains the mirror and counter the way the creation path would.
    pub fn seed(&self, invitation: Invitation) {
        let mut state = self.state.lock().expect("home graph mutex poisoned");
        seed_locked(&mut state, invitation);
    }

    /// Read a contractor's CRM entry for one claimant, if any.
    pub fn customer(&self, contractor: &ContractorId, claimant: &ClaimantId) -> Option<Customer> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        state
            .customers
            .get(contractor)
            .and_then(|customers| customers.get(claimant))
            .cloned()
    }

    pub fn invitation(&self, id: &InvitationId) -> Option<Invitation> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        state.invitations.get(id).cloned()
    }
}

impl InvitationRepository for MemoryHomeGraph {
    fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state
            .invitations
            .values()
            .find(|invitation| invitation.claim_token == token)
            .cloned())
    }

    fn fetch(&self, id: &InvitationId) -> Result<Option<Invitation>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state.invitations.get(id).cloned())
    }

    fn unlinked_for_email(
        &self,
        contractor_email: &str,
    ) -> Result<Vec<Invitation>, RepositoryError> {
        let needle = contractor_email.trim().to_ascii_lowercase();
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state
            .invitations
            .values()
            .filter(|invitation| {
                invitation.contractor_id.is_none() && invitation.contractor_email == needle
            })
            .cloned()
            .collect())
    }

    fn commit_claim(&self, set: ClaimWriteSet) -> Result<ClaimReceipt, RepositoryError> {
        let mut state = self.state.lock().expect("home graph mutex poisoned");

        // The fresh read under the lock is the guard the whole protocol
        // leans on: exactly one concurrent caller sees `Pending`.
        let invitation = state
            .invitations
            .get_mut(&set.invitation_id)
            .ok_or(RepositoryError::NotFound)?;
        if invitation.status != InvitationStatus::Pending {
            return Err(RepositoryError::ClaimGuard);
        }
        invitation.status = InvitationStatus::Claimed;
        invitation.claimed_at = Some(set.claimed_at);
        invitation.claimed_by = Some(set.claimed_by.clone());
        let invitation = invitation.clone();

        let entries = state
            .inventory
            .entry((set.claimed_by.clone(), set.destination.clone()))
            .or_default();
        let already_imported = entries
            .iter()
            .any(|item| item.source_invitation_id.as_ref() == Some(&set.invitation_id));
        let imported_count = if already_imported {
            0
        } else {
            entries.extend(set.items.iter().cloned());
            set.items.len()
        };

        let mut customer_created = false;
        if let Some(upsert) = set.customer {
            let customers = state
                .customers
                .entry(upsert.contractor_id.clone())
                .or_default();
            match customers.get_mut(&upsert.claimant_id) {
                Some(existing) => {
                    existing.total_jobs += upsert.job_increment;
                    existing.total_spend_cents += upsert.spend_delta_cents;
                    existing.last_contact = upsert.last_contact;
                }
                None => {
                    customers.insert(
                        upsert.claimant_id.clone(),
                        Customer {
                            claimant_id: upsert.claimant_id.clone(),
                            customer_name: upsert.customer_name.clone(),
                            property_name: upsert.property_name.clone(),
                            total_jobs: upsert.job_increment,
                            total_spend_cents: upsert.spend_delta_cents,
                            last_contact: upsert.last_contact,
                        },
                    );
                    customer_created = true;
                }
            }

            if let Some(mirror) = state
                .mirrors
                .get_mut(&upsert.contractor_id)
                .and_then(|mirrors| mirrors.get_mut(&set.invitation_id))
            {
                mirror.status = InvitationStatus::Claimed;
                mirror.claimed_at = Some(set.claimed_at);
                mirror.claimed_by = Some(set.claimed_by.clone());
                mirror.customer_name = Some(upsert.customer_name.clone());
                mirror.customer_property_name = Some(upsert.property_name.clone());
            }

            if customer_created {
                state
                    .stats
                    .entry(upsert.contractor_id.clone())
                    .or_default()
                    .total_customers += 1;
            }
        }

        Ok(ClaimReceipt {
            invitation,
            imported_count,
            customer_created,
        })
    }

    fn apply_link_chunk(&self, chunk: &[LinkWrite]) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("home graph mutex poisoned");
        for write in chunk {
            let linked = match state.invitations.get_mut(&write.invitation_id) {
                Some(invitation) if invitation.contractor_id.is_none() => {
                    invitation.contractor_id = Some(write.contractor_id.clone());
                    invitation.linked_at = Some(write.linked_at);
                    true
                }
                _ => false,
            };
            if linked {
                state
                    .mirrors
                    .entry(write.contractor_id.clone())
                    .or_default()
                    .insert(write.invitation_id.clone(), write.mirror.clone());
            }
        }
        Ok(())
    }

    fn mirrors_for(
        &self,
        contractor: &ContractorId,
    ) -> Result<Vec<ContractorInvitationRecord>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state
            .mirrors
            .get(contractor)
            .map(|mirrors| mirrors.values().cloned().collect())
            .unwrap_or_default())
    }

    fn contractor_stats(
        &self,
        contractor: &ContractorId,
    ) -> Result<ContractorStats, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state.stats.get(contractor).copied().unwrap_or_default())
    }

    fn put_contractor_stats(
        &self,
        contractor: &ContractorId,
        stats: ContractorStats,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("home graph mutex poisoned");
        state.stats.insert(contractor.clone(), stats);
        Ok(())
    }

    fn pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InvitationId>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state
            .invitations
            .values()
            .filter(|invitation| {
                invitation.status == InvitationStatus::Pending && invitation.created_at < cutoff
            })
            .map(|invitation| invitation.id.clone())
            .collect())
    }

    fn mark_expired(&self, id: &InvitationId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("home graph mutex poisoned");
        let invitation = state
            .invitations
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if invitation.status != InvitationStatus::Pending {
            return Err(RepositoryError::ClaimGuard);
        }
        invitation.status = InvitationStatus::Expired;
        let contractor = invitation.contractor_id.clone();
        if let Some(contractor) = contractor {
            if let Some(mirror) = state
                .mirrors
                .get_mut(&contractor)
                .and_then(|mirrors| mirrors.get_mut(id))
            {
                mirror.status = InvitationStatus::Expired;
            }
        }
        Ok(())
    }

    fn insert(&self, invitation: Invitation) -> Result<Invitation, RepositoryError> {
        let mut state = self.state.lock().expect("home graph mutex poisoned");
        if state.invitations.contains_key(&invitation.id) {
            return Err(RepositoryError::Conflict);
        }
        seed_locked(&mut state, invitation.clone());
        Ok(invitation)
    }
}

impl PropertyRepository for MemoryHomeGraph {
    fn properties_for(
        &self,
        claimant: &ClaimantId,
    ) -> Result<Vec<PropertySummary>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state.properties.get(claimant).cloned().unwrap_or_default())
    }

    fn create_property(
        &self,
        claimant: &ClaimantId,
        name: &str,
    ) -> Result<PropertySummary, RepositoryError> {
        let sequence = self.property_sequence.fetch_add(1, Ordering::Relaxed);
        let property = PropertySummary {
            id: PropertyId(format!("prop-{sequence:04}")),
            name: name.to_string(),
        };
        let mut state = self.state.lock().expect("home graph mutex poisoned");
        state
            .properties
            .entry(claimant.clone())
            .or_default()
            .push(property.clone());
        Ok(property)
    }

    fn find_property(
        &self,
        claimant: &ClaimantId,
        property: &PropertyId,
    ) -> Result<Option<PropertySummary>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state
            .properties
            .get(claimant)
            .and_then(|properties| properties.iter().find(|summary| &summary.id == property))
            .cloned())
    }

    fn inventory_for(
        &self,
        claimant: &ClaimantId,
        property: &PropertyId,
    ) -> Result<Vec<InventoryItem>, RepositoryError> {
        let state = self.state.lock().expect("home graph mutex poisoned");
        Ok(state
            .inventory
            .get(&(claimant.clone(), property.clone()))
            .cloned()
            .unwrap_or_default())
    }
}
