//! HTTP scrape endpoint for the managed cluster metrics.

pub mod encoding;

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::{error, info};

use ocm_application::MetricsGenerator;

pub use encoding::{TEXT_CONTENT_TYPE, encode_text};

#[derive(Clone)]
pub struct ExpositionState {
    generator: MetricsGenerator,
}

/// `/metrics` runs a generation pass per request; `/readyz` reports 503
/// until the mirror has completed its first listing.
pub fn router(generator: MetricsGenerator) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(ExpositionState { generator })
}

async fn metrics_handler(State(state): State<ExpositionState>) -> Response {
    let families = state.generator.generate().await;
    match encode_text(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(err) => {
            error!("Failed to render metrics: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<ExpositionState>) -> (StatusCode, &'static str) {
    if state.generator.store().has_synced() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "mirror not synced")
    }
}

pub async fn serve<F>(addr: SocketAddr, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {addr}"))?;
    info!(%addr, "Serving managed cluster metrics");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("metrics server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use ocm_application::{
        EnrichmentResolver, ManagedClusterDescriptors, MirrorStore, managed_cluster_families,
    };
    use ocm_domain::ManagedCluster;
    use ocm_ports::StaticDeploymentLookup;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(store: &MirrorStore) -> Router {
        router(MetricsGenerator::new(
            store.clone(),
            managed_cluster_families(ManagedClusterDescriptors::default()),
            EnrichmentResolver::new(Arc::new(StaticDeploymentLookup::new(["c1"]))),
        ))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn readiness_follows_first_listing() {
        let store = MirrorStore::new();
        assert_eq!(get(app(&store), "/readyz").await.0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get(app(&store), "/healthz").await.0, StatusCode::OK);

        store.replace(Vec::new());
        assert_eq!(get(app(&store), "/readyz").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_current_mirror() {
        let store = MirrorStore::new();
        store.replace(vec![
            ManagedCluster::new("c1")
                .with_label("vendor", "OpenShift")
                .with_kubernetes_version("v1.27.3"),
        ]);

        let (status, body) = get(app(&store), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(
            "ocm_managedcluster_labels{managedcluster=\"c1\",vendor=\"OpenShift\",cloud=\"\",created_via=\"hive\",version=\"v1.27.3\"} 1"
        ));
        assert!(!body.contains("ocm_managedcluster_created"));
    }
}
