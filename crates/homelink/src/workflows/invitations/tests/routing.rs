use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{draft, invitation, policy, unlinked_invitation, MemoryHomeGraph};
use crate::workflows::invitations::domain::ClaimantId;
use crate::workflows::invitations::repository::PropertyRepository;
use crate::workflows::invitations::router::invitation_router;
use crate::workflows::invitations::service::InvitationService;

fn build_router() -> (axum::Router, Arc<MemoryHomeGraph>) {
    let graph = Arc::new(MemoryHomeGraph::default());
    let service = Arc::new(InvitationService::new(
        graph.clone(),
        graph.clone(),
        policy(),
    ));
    (invitation_router(service), graph)
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn validate_endpoint_returns_the_preview() {
    let (router, graph) = build_router();
    graph.seed(invitation("inv-1", "tok-1"));

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/invitations/claim/tok-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload.get("valid"), Some(&json!(true)));
    let preview = payload.get("invitation").expect("preview present");
    assert_eq!(preview.get("record_count"), Some(&json!(3)));
    assert_eq!(
        preview.get("contractor_name"),
        Some(&json!("All Seasons Home Services"))
    );
}

#[tokio::test]
async fn validate_endpoint_maps_unknown_tokens_to_404() {
    let (router, _) = build_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/invitations/claim/tok-ghost")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json(response).await;
    assert_eq!(payload.get("valid"), Some(&json!(false)));
    assert_eq!(payload.get("error"), Some(&json!("not_found")));
}

fn claim_body(property_id: &str) -> Value {
    json!({
        "session": {
            "claimant_id": "claimant-1",
            "email": "jordan@example.com",
            "display_name": "Jordan Avery",
        },
        "destination_property_id": property_id,
    })
}

async fn post_claim(router: &axum::Router, invitation_id: &str, body: &Value) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/invitations/{invitation_id}/claim"))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).expect("serialize")))
                .expect("request"),
        )
        .await
        .expect("router dispatch")
}

#[tokio::test]
async fn claim_endpoint_imports_and_reports_the_contractor() {
    let (router, graph) = build_router();
    graph.seed(invitation("inv-1", "tok-1"));
    let property = graph
        .create_property(&ClaimantId("claimant-1".to_string()), "Maple Street House")
        .expect("property created");

    let response = post_claim(&router, "inv-1", &claim_body(&property.id.0)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload.get("success"), Some(&json!(true)));
    assert_eq!(payload.get("imported_count"), Some(&json!(3)));
    assert_eq!(
        payload.pointer("/contractor/name"),
        Some(&json!("All Seasons Home Services"))
    );
}

#[tokio::test]
async fn second_claim_conflicts_with_a_typed_code() {
    let (router, graph) = build_router();
    graph.seed(invitation("inv-1", "tok-1"));
    let property = graph
        .create_property(&ClaimantId("claimant-1".to_string()), "Maple Street House")
        .expect("property created");
    let body = claim_body(&property.id.0);

    let first = post_claim(&router, "inv-1", &body).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = post_claim(&router, "inv-1", &body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let payload = read_json(second).await;
    assert_eq!(payload.get("success"), Some(&json!(false)));
    assert_eq!(payload.get("error"), Some(&json!("already_claimed")));
}

#[tokio::test]
async fn claim_with_unknown_destination_is_unprocessable() {
    let (router, graph) = build_router();
    graph.seed(invitation("inv-1", "tok-1"));

    let response = post_claim(&router, "inv-1", &claim_body("prop-missing")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json(response).await;
    assert_eq!(payload.get("error"), Some(&json!("invalid_property")));
}

#[tokio::test]
async fn link_endpoint_accepts_and_reports_counts() {
    let (router, graph) = build_router();
    graph.seed(unlinked_invitation("inv-a", "tok-a", "pat@handyworks.example"));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/contractors/contractor-new/link")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "email": "pat@handyworks.example" }))
                        .expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json(response).await;
    assert_eq!(payload.get("migrated_count"), Some(&json!(1)));
    assert_eq!(payload.get("claimed_count"), Some(&json!(0)));
}

#[tokio::test]
async fn dashboard_endpoint_serves_mirrors_and_stats() {
    let (router, graph) = build_router();
    graph.seed(invitation("inv-1", "tok-1"));
    graph.seed(invitation("inv-2", "tok-2"));

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/contractors/contractor-1/invitations")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    let invitations = payload
        .get("invitations")
        .and_then(Value::as_array)
        .expect("mirror list");
    assert_eq!(invitations.len(), 2);
    assert_eq!(
        payload.pointer("/stats/total_invitations"),
        Some(&json!(2))
    );
}

#[tokio::test]
async fn created_invitations_are_immediately_claimable() {
    let (router, _) = build_router();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/invitations")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&draft()).expect("serialize")))
                .expect("request"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json(response).await;
    let token = payload
        .get("claim_token")
        .and_then(Value::as_str)
        .expect("token minted")
        .to_string();
    assert_eq!(payload.get("status"), Some(&json!("pending")));

    let validation = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/v1/invitations/claim/{token}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    assert_eq!(validation.status(), StatusCode::OK);
}
