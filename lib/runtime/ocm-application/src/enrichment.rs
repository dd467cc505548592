use std::sync::Arc;

use anyhow::{Context, Result};

use ocm_ports::ClusterDeploymentLookup;

/// How a managed cluster came to be registered with the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Provisioned through Hive; a ClusterDeployment of the same name exists.
    Hive,
    /// Registered from outside; no ClusterDeployment exists.
    Imported,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Hive => "hive",
            Provenance::Imported => "imported",
        }
    }
}

/// Classifies clusters by looking up their ClusterDeployment.
///
/// Results are never cached: every call reflects the server at call time.
#[derive(Clone)]
pub struct EnrichmentResolver {
    lookup: Arc<dyn ClusterDeploymentLookup>,
}

impl EnrichmentResolver {
    pub fn new(lookup: Arc<dyn ClusterDeploymentLookup>) -> Self {
        Self { lookup }
    }

    /// ClusterDeployments live in a namespace named after the cluster.
    pub async fn classify(&self, cluster_name: &str) -> Result<Provenance> {
        let exists = self
            .lookup
            .exists(cluster_name, cluster_name)
            .await
            .with_context(|| format!("failed to look up ClusterDeployment {cluster_name}"))?;
        Ok(if exists {
            Provenance::Hive
        } else {
            Provenance::Imported
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocm_ports::StaticDeploymentLookup;

    #[tokio::test]
    async fn existing_deployment_means_hive() {
        let resolver = EnrichmentResolver::new(Arc::new(StaticDeploymentLookup::new(["c1"])));
        assert_eq!(resolver.classify("c1").await.unwrap(), Provenance::Hive);
        assert_eq!(resolver.classify("c2").await.unwrap(), Provenance::Imported);
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let resolver = EnrichmentResolver::new(Arc::new(
            StaticDeploymentLookup::new(["c1"]).failing_for("c1"),
        ));
        let err = resolver.classify("c1").await.unwrap_err();
        assert!(format!("{err:#}").contains("forbidden"));
    }

    #[tokio::test]
    async fn every_call_reaches_the_server() {
        let lookup = Arc::new(StaticDeploymentLookup::new(["c1"]));
        let resolver = EnrichmentResolver::new(lookup.clone());
        resolver.classify("c1").await.unwrap();
        resolver.classify("c1").await.unwrap();
        assert_eq!(lookup.calls(), 2);
    }
}
