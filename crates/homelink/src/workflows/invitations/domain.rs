use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for invitations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvitationId(pub String);

/// Identifier wrapper for contractor accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractorId(pub String);

/// Identifier wrapper for the authenticated claimant (homeowner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimantId(pub String);

/// Identifier wrapper for a claimant-owned destination property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Lifecycle of an invitation. Transitions are monotonic: `Pending` may move
/// to `Claimed` or `Expired`, and neither terminal state is ever left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    Pending,
    Claimed,
    Expired,
}

impl InvitationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Claimed => "claimed",
            InvitationStatus::Expired => "expired",
        }
    }
}

/// Broad categorization for imported home records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordCategory {
    Appliance,
    Hvac,
    Plumbing,
    Electrical,
    Exterior,
    Other,
}

impl RecordCategory {
    pub const fn label(self) -> &'static str {
        match self {
            RecordCategory::Appliance => "appliance",
            RecordCategory::Hvac => "hvac",
            RecordCategory::Plumbing => "plumbing",
            RecordCategory::Electrical => "electrical",
            RecordCategory::Exterior => "exterior",
            RecordCategory::Other => "other",
        }
    }
}

/// A single import-candidate item carried by an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub name: String,
    pub category: RecordCategory,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub cost_cents: u32,
    pub maintenance_hints: Vec<String>,
}

/// A single-use, tokenized offer from a contractor to import a set of
/// service records into a customer's home profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub claim_token: String,
    /// None until the creating contractor has an account; set exactly once
    /// by the linking sweep.
    pub contractor_id: Option<ContractorId>,
    /// Lowercased at creation, the only contractor handle pre-link.
    pub contractor_email: String,
    pub contractor_name: String,
    /// When set, claiming is locked to this address (case-insensitive).
    pub recipient_email: Option<String>,
    pub status: InvitationStatus,
    pub records: Vec<ImportRecord>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<ClaimantId>,
    pub linked_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    pub fn total_value_cents(&self) -> u64 {
        self.records
            .iter()
            .map(|record| u64::from(record.cost_cents))
            .sum()
    }

    /// Read-only projection shown before a claim completes. Caps the record
    /// summaries at `preview_cap` and never exposes the full payload or the
    /// locked recipient address.
    pub fn preview(&self, preview_cap: usize) -> InvitationPreview {
        InvitationPreview {
            invitation_id: self.id.clone(),
            contractor_name: self.contractor_name.clone(),
            record_count: self.records.len(),
            total_value_cents: self.total_value_cents(),
            sample_records: self
                .records
                .iter()
                .take(preview_cap)
                .map(|record| RecordSummary {
                    name: record.name.clone(),
                    category: record.category.label(),
                })
                .collect(),
            email_locked: self.recipient_email.is_some(),
        }
    }
}

/// Compact record line surfaced in the pre-claim preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub name: String,
    pub category: &'static str,
}

/// What an anonymous visitor sees when resolving a claim link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationPreview {
    pub invitation_id: InvitationId,
    pub contractor_name: String,
    pub record_count: usize,
    pub total_value_cents: u64,
    pub sample_records: Vec<RecordSummary>,
    pub email_locked: bool,
}

/// Denormalized copy of an invitation kept under the contractor's own
/// namespace so the contractor dashboard never queries across accounts.
/// Maintained exclusively by the claim and linking write paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractorInvitationRecord {
    pub id: InvitationId,
    pub status: InvitationStatus,
    pub record_count: usize,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<ClaimantId>,
    pub customer_name: Option<String>,
    pub customer_property_name: Option<String>,
    pub linked_at: Option<DateTime<Utc>>,
}

impl ContractorInvitationRecord {
    /// Seed a mirror from the source invitation's current state. Used by the
    /// linking sweep, which may encounter invitations claimed pre-link.
    pub fn seeded_from(invitation: &Invitation, linked_at: DateTime<Utc>) -> Self {
        Self {
            id: invitation.id.clone(),
            status: invitation.status,
            record_count: invitation.records.len(),
            created_at: invitation.created_at,
            claimed_at: invitation.claimed_at,
            claimed_by: invitation.claimed_by.clone(),
            customer_name: None,
            customer_property_name: None,
            linked_at: Some(linked_at),
        }
    }
}

/// Contractor-owned CRM entry, keyed by claimant identity. Created or
/// updated on claim completion, never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub claimant_id: ClaimantId,
    pub customer_name: String,
    pub property_name: String,
    pub total_jobs: u32,
    pub total_spend_cents: u64,
    pub last_contact: DateTime<Utc>,
}

/// Aggregate counters embedded in the contractor profile. The cheap counters
/// move by increments; `claim_rate` is reconciled by full recount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContractorStats {
    pub total_invitations: u32,
    pub total_customers: u32,
    pub claim_rate: f32,
}

/// Inventory entry created under the claimant's destination property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub property_id: PropertyId,
    pub name: String,
    pub category: RecordCategory,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub cost_cents: u32,
    pub maintenance_hints: Vec<String>,
    /// Set for imported entries so a replayed claim can detect prior import.
    pub source_invitation_id: Option<InvitationId>,
    pub imported_at: DateTime<Utc>,
}

/// Claimant destination container for imported records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub name: String,
}

/// Contractor-supplied draft for a new invitation; the service mints the id
/// and claim token and normalizes the addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvitation {
    pub contractor_id: Option<ContractorId>,
    pub contractor_email: String,
    pub contractor_name: String,
    pub recipient_email: Option<String>,
    pub records: Vec<ImportRecord>,
}

/// Explicit identity context handed to claim and migration operations.
/// Passed as a parameter, never read from ambient global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub claimant_id: ClaimantId,
    pub email: String,
    pub display_name: String,
}

/// Contractor display info returned to the claimant's terminal screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorInfo {
    pub name: String,
}

/// Terminal, user-visible reasons a token cannot be (or was not) redeemed.
/// Returned as typed values rather than thrown so the client flow can route
/// directly on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NotFound,
    Expired,
    AlreadyClaimed,
    EmailMismatch,
    InvalidProperty,
}

impl DenialReason {
    pub const fn code(self) -> &'static str {
        match self {
            DenialReason::NotFound => "not_found",
            DenialReason::Expired => "expired",
            DenialReason::AlreadyClaimed => "already_claimed",
            DenialReason::EmailMismatch => "email_mismatch",
            DenialReason::InvalidProperty => "invalid_property",
        }
    }

    /// Whether re-submitting the same request could ever succeed.
    pub const fn retryable(self) -> bool {
        matches!(self, DenialReason::InvalidProperty)
    }
}
