//! Invitation claim & contractor-linking workflow.
//!
//! A contractor sends a customer a one-time claim link; redeeming it imports
//! the invitation's records into the customer's home profile and registers
//! the customer in the contractor's CRM. Invitations created before the
//! contractor had an account are swept into it after sign-up. The claim is
//! at-most-once under concurrency, and the contractor's dashboard reads only
//! its own denormalized mirrors.

pub(crate) mod claim;
pub mod domain;
pub mod flow;
pub(crate) mod linking;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod stats;
pub mod validation;

#[cfg(test)]
mod tests;

pub use claim::{ClaimCompletion, ClaimOrchestrator, ClaimOutcome, ClaimRequest};
pub use domain::{
    AuthSession, ClaimantId, ContractorId, ContractorInfo, ContractorInvitationRecord,
    ContractorStats, Customer, DenialReason, ImportRecord, Invitation, InvitationId,
    InvitationPreview, InvitationStatus, InventoryItem, NewInvitation, PropertyId,
    PropertySummary, RecordCategory, RecordSummary,
};
pub use flow::{ClaimFlow, ClaimFlowEvent, ClaimFlowState, DestinationSelection};
pub use linking::{AccountLinker, MigrationOutcome};
pub use memory::MemoryHomeGraph;
pub use repository::{
    ClaimReceipt, ClaimWriteSet, ContractorDashboard, CustomerUpsert, InvitationRepository,
    LinkWrite, PropertyRepository, RepositoryError,
};
pub use router::invitation_router;
pub use service::InvitationService;
pub use stats::StatsAggregator;
pub use validation::{ClaimPolicy, EmailGate, EmailMatch, TokenValidation, TokenValidator};
