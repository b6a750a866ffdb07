use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::claim::{ClaimOutcome, ClaimRequest};
use super::domain::{AuthSession, ContractorId, DenialReason, InvitationId, NewInvitation, PropertyId};
use super::repository::{InvitationRepository, PropertyRepository, RepositoryError};
use super::service::InvitationService;
use super::validation::TokenValidation;

/// Router builder exposing the claim & linking protocol over HTTP.
pub fn invitation_router<R, P>(service: Arc<InvitationService<R, P>>) -> Router
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    Router::new()
        .route("/api/v1/invitations", post(create_handler::<R, P>))
        .route(
            "/api/v1/invitations/claim/:token",
            get(validate_handler::<R, P>),
        )
        .route(
            "/api/v1/invitations/:invitation_id/claim",
            post(claim_handler::<R, P>),
        )
        .route(
            "/api/v1/contractors/:contractor_id/link",
            post(link_handler::<R, P>),
        )
        .route(
            "/api/v1/contractors/:contractor_id/invitations",
            get(dashboard_handler::<R, P>),
        )
        .with_state(service)
}

const fn denial_status(reason: DenialReason) -> StatusCode {
    match reason {
        DenialReason::NotFound => StatusCode::NOT_FOUND,
        DenialReason::Expired => StatusCode::GONE,
        DenialReason::AlreadyClaimed => StatusCode::CONFLICT,
        DenialReason::EmailMismatch => StatusCode::FORBIDDEN,
        DenialReason::InvalidProperty => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn repository_failure(error: RepositoryError) -> Response {
    let status = if error.is_transient() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn validate_handler<R, P>(
    State(service): State<Arc<InvitationService<R, P>>>,
    Path(token): Path<String>,
) -> Response
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    match service.validate(&token, Utc::now()) {
        Ok(TokenValidation::Usable { preview, .. }) => {
            let payload = json!({ "valid": true, "invitation": preview });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(TokenValidation::Unusable(reason)) => {
            let payload = json!({ "valid": false, "error": reason.code() });
            (denial_status(reason), axum::Json(payload)).into_response()
        }
        Err(error) => repository_failure(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimBody {
    pub(crate) session: AuthSession,
    pub(crate) destination_property_id: PropertyId,
}

pub(crate) async fn claim_handler<R, P>(
    State(service): State<Arc<InvitationService<R, P>>>,
    Path(invitation_id): Path<String>,
    axum::Json(body): axum::Json<ClaimBody>,
) -> Response
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    let request = ClaimRequest {
        invitation_id: InvitationId(invitation_id),
        session: body.session,
        destination: body.destination_property_id,
        now: Utc::now(),
    };

    match service.claim(request) {
        Ok(ClaimOutcome::Completed(completion)) => {
            let payload = json!({
                "success": true,
                "imported_count": completion.imported_count,
                "contractor": { "name": completion.contractor.name },
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(ClaimOutcome::Denied(reason)) => {
            let payload = json!({ "success": false, "error": reason.code() });
            (denial_status(reason), axum::Json(payload)).into_response()
        }
        Err(error) => repository_failure(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkBody {
    pub(crate) email: String,
}

/// Fire-and-forget migration trigger invoked right after a contractor
/// authenticates. Always accepts; sweep failures are logged server-side and
/// retried on the next sign-in.
pub(crate) async fn link_handler<R, P>(
    State(service): State<Arc<InvitationService<R, P>>>,
    Path(contractor_id): Path<String>,
    axum::Json(body): axum::Json<LinkBody>,
) -> Response
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    let outcome = service.migrate_quietly(
        &ContractorId(contractor_id),
        &body.email,
        Utc::now(),
    );

    let payload = json!({
        "migrated_count": outcome.migrated_count,
        "claimed_count": outcome.claimed_count,
    });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}

pub(crate) async fn dashboard_handler<R, P>(
    State(service): State<Arc<InvitationService<R, P>>>,
    Path(contractor_id): Path<String>,
) -> Response
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    match service.contractor_dashboard(&ContractorId(contractor_id)) {
        Ok(dashboard) => (StatusCode::OK, axum::Json(dashboard)).into_response(),
        Err(error) => repository_failure(error),
    }
}

pub(crate) async fn create_handler<R, P>(
    State(service): State<Arc<InvitationService<R, P>>>,
    axum::Json(draft): axum::Json<NewInvitation>,
) -> Response
where
    R: InvitationRepository + 'static,
    P: PropertyRepository + 'static,
{
    match service.create_invitation(draft, Utc::now()) {
        Ok(invitation) => {
            let payload = json!({
                "invitation_id": invitation.id,
                "claim_token": invitation.claim_token,
                "status": invitation.status.label(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(RepositoryError::Conflict) => {
            let payload = json!({ "error": "invitation already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => repository_failure(error),
    }
}
