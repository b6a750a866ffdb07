use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use homelink::config::ClaimPolicyConfig;
use homelink::workflows::invitations::{ClaimPolicy, InvitationService, MemoryHomeGraph};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The service runs on the in-memory home graph until a document store is
/// wired in; both repository roles are served by the same graph.
pub(crate) type HomeGraphService = InvitationService<MemoryHomeGraph, MemoryHomeGraph>;

pub(crate) fn build_service(claims: &ClaimPolicyConfig) -> (Arc<HomeGraphService>, Arc<MemoryHomeGraph>) {
    let graph = Arc::new(MemoryHomeGraph::default());
    let service = Arc::new(InvitationService::new(
        graph.clone(),
        graph.clone(),
        ClaimPolicy::from(claims),
    ));
    (service, graph)
}
