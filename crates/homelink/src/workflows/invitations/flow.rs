use super::domain::{AuthSession, DenialReason, InvitationPreview, PropertyId, PropertySummary};
use super::validation::{EmailMatch, TokenValidation};

/// Everything the destination-selection step needs, kept together so a
/// transient import failure can restore the user's selections exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationSelection {
    pub session: AuthSession,
    pub preview: InvitationPreview,
    pub properties: Vec<PropertySummary>,
    pub selected: Option<PropertyId>,
    /// Set when the last import attempt failed transiently; cleared on the
    /// next confirm.
    pub retry_notice: Option<String>,
}

/// Client-side claim flow as an explicit state machine. Each state carries
/// only the data valid in that state; transitions happen exclusively through
/// [`ClaimFlow::apply`], which performs no IO.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimFlowState {
    /// Token validated; contractor and record preview on screen.
    Preview { preview: InvitationPreview },
    /// Waiting on the external authentication collaborator.
    Auth { preview: InvitationPreview },
    /// Destination property selection.
    Property(DestinationSelection),
    /// Claim transaction issued; indivisible, no cancellation.
    Importing {
        context: DestinationSelection,
        destination: PropertyId,
    },
    /// Terminal: import landed.
    Success {
        imported_count: usize,
        contractor_name: String,
    },
    /// Terminal: the token cannot be redeemed.
    Failed { reason: DenialReason },
    /// Terminal: the user left before any mutation was issued.
    Abandoned,
}

/// Inputs observed by the flow. Effectful steps (authentication, property
/// loading, the claim call) happen outside; their results come back as
/// events.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimFlowEvent {
    AcceptedSignedOut,
    AcceptedSignedIn {
        session: AuthSession,
        email_match: EmailMatch,
    },
    Authenticated {
        session: AuthSession,
        email_match: EmailMatch,
    },
    PropertiesLoaded {
        properties: Vec<PropertySummary>,
    },
    DestinationChosen {
        property: PropertyId,
    },
    DestinationCreated {
        property: PropertySummary,
    },
    ConfirmImport,
    ImportCompleted {
        imported_count: usize,
        contractor_name: String,
    },
    ImportDenied {
        reason: DenialReason,
    },
    ImportFailedTransient {
        message: String,
    },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimFlow {
    state: ClaimFlowState,
}

impl ClaimFlow {
    /// Entry point: a validation result either opens the preview or lands
    /// directly in the terminal failure state.
    pub fn from_validation(validation: TokenValidation) -> Self {
        let state = match validation {
            TokenValidation::Usable { preview, .. } => ClaimFlowState::Preview { preview },
            TokenValidation::Unusable(reason) => ClaimFlowState::Failed { reason },
        };
        Self { state }
    }

    pub fn state(&self) -> &ClaimFlowState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ClaimFlowState::Success { .. }
                | ClaimFlowState::Failed { .. }
                | ClaimFlowState::Abandoned
        )
    }

    /// Pure reducer. Events that make no sense in the current state leave it
    /// unchanged, so a stale or duplicated UI event can never corrupt the
    /// flow.
    pub fn apply(&mut self, event: ClaimFlowEvent) {
        let state = std::mem::replace(&mut self.state, ClaimFlowState::Abandoned);
        self.state = Self::next(state, event);
    }

    fn next(state: ClaimFlowState, event: ClaimFlowEvent) -> ClaimFlowState {
        match (state, event) {
            (ClaimFlowState::Preview { preview }, ClaimFlowEvent::AcceptedSignedOut) => {
                ClaimFlowState::Auth { preview }
            }
            (
                ClaimFlowState::Preview { preview },
                ClaimFlowEvent::AcceptedSignedIn {
                    session,
                    email_match,
                },
            )
            | (
                ClaimFlowState::Auth { preview },
                ClaimFlowEvent::Authenticated {
                    session,
                    email_match,
                },
            ) => match email_match {
                EmailMatch::Matches => ClaimFlowState::Property(DestinationSelection {
                    session,
                    preview,
                    properties: Vec::new(),
                    selected: None,
                    retry_notice: None,
                }),
                EmailMatch::Mismatch => ClaimFlowState::Failed {
                    reason: DenialReason::EmailMismatch,
                },
            },
            (
                ClaimFlowState::Property(mut selection),
                ClaimFlowEvent::PropertiesLoaded { properties },
            ) => {
                // Drop a selection the refreshed list no longer contains.
                if let Some(selected) = &selection.selected {
                    if !properties.iter().any(|property| &property.id == selected) {
                        selection.selected = None;
                    }
                }
                selection.properties = properties;
                ClaimFlowState::Property(selection)
            }
            (
                ClaimFlowState::Property(mut selection),
                ClaimFlowEvent::DestinationChosen { property },
            ) => {
                if selection.properties.iter().any(|known| known.id == property) {
                    selection.selected = Some(property);
                }
                ClaimFlowState::Property(selection)
            }
            (
                ClaimFlowState::Property(mut selection),
                ClaimFlowEvent::DestinationCreated { property },
            ) => {
                selection.selected = Some(property.id.clone());
                selection.properties.push(property);
                ClaimFlowState::Property(selection)
            }
            (ClaimFlowState::Property(mut selection), ClaimFlowEvent::ConfirmImport) => {
                match selection.selected.clone() {
                    Some(destination) => {
                        selection.retry_notice = None;
                        ClaimFlowState::Importing {
                            context: selection,
                            destination,
                        }
                    }
                    None => ClaimFlowState::Property(selection),
                }
            }
            (
                ClaimFlowState::Importing { .. },
                ClaimFlowEvent::ImportCompleted {
                    imported_count,
                    contractor_name,
                },
            ) => ClaimFlowState::Success {
                imported_count,
                contractor_name,
            },
            (ClaimFlowState::Importing { .. }, ClaimFlowEvent::ImportDenied { reason }) => {
                ClaimFlowState::Failed { reason }
            }
            (
                ClaimFlowState::Importing { mut context, .. },
                ClaimFlowEvent::ImportFailedTransient { message },
            ) => {
                // Selections survive so the user can retry without re-entering
                // anything.
                context.retry_notice = Some(message);
                ClaimFlowState::Property(context)
            }
            (
                ClaimFlowState::Preview { .. }
                | ClaimFlowState::Auth { .. }
                | ClaimFlowState::Property(_),
                ClaimFlowEvent::Cancelled,
            ) => {
                // No mutation has been issued before `Importing`, so leaving
                // here is always side-effect free.
                ClaimFlowState::Abandoned
            }
            (state, _) => state,
        }
    }
}
