use std::sync::Arc;

use tracing::{debug, warn};

use ocm_domain::MetricFamily;

use crate::enrichment::EnrichmentResolver;
use crate::families::FamilyGenerator;
use crate::store::MirrorStore;

/// Runs every family over the mirror for one scrape.
#[derive(Clone)]
pub struct MetricsGenerator {
    store: MirrorStore,
    families: Arc<[FamilyGenerator]>,
    resolver: EnrichmentResolver,
}

impl MetricsGenerator {
    pub fn new(
        store: MirrorStore,
        families: Vec<FamilyGenerator>,
        resolver: EnrichmentResolver,
    ) -> Self {
        Self {
            store,
            families: families.into(),
            resolver,
        }
    }

    pub fn store(&self) -> &MirrorStore {
        &self.store
    }

    /// One generation pass over a single snapshot.
    ///
    /// A failed projection drops that family's samples for that cluster
    /// only; the rest of the pass continues. Lookups run one at a time.
    pub async fn generate(&self) -> Vec<MetricFamily> {
        let snapshot = self.store.snapshot();
        let mut output = Vec::with_capacity(self.families.len());

        for family in self.families.iter() {
            let descriptor = family.descriptor();
            let mut generated = MetricFamily::empty(descriptor);
            for cluster in &snapshot {
                match family.generate(cluster, &self.resolver).await {
                    Ok(metrics) => generated.metrics.extend(metrics),
                    Err(err) => warn!(
                        family = %descriptor.name,
                        cluster = %cluster.name,
                        "Skipping metric sample: {err:#}"
                    ),
                }
            }
            output.push(generated);
        }

        debug!(
            clusters = snapshot.len(),
            families = output.len(),
            "Generated managed cluster metrics"
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::{ManagedClusterDescriptors, managed_cluster_families};
    use crate::labels::CLUSTER_LABEL;
    use chrono::{TimeZone, Utc};
    use anyhow::Result;
    use async_trait::async_trait;
    use ocm_domain::{ClusterChange, ManagedCluster};
    use ocm_ports::{ClusterDeploymentLookup, StaticDeploymentLookup};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// Holds the first lookup of `name` until released.
    struct PausingLookup {
        name: &'static str,
        paused: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl PausingLookup {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                paused: AtomicBool::new(false),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl ClusterDeploymentLookup for PausingLookup {
        async fn exists(&self, _namespace: &str, name: &str) -> Result<bool> {
            if name == self.name && !self.paused.swap(true, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(false)
        }
    }

    fn generator(store: &MirrorStore, lookup: Arc<StaticDeploymentLookup>) -> MetricsGenerator {
        MetricsGenerator::new(
            store.clone(),
            managed_cluster_families(ManagedClusterDescriptors::default()),
            EnrichmentResolver::new(lookup),
        )
    }

    #[tokio::test]
    async fn every_sample_leads_with_its_cluster() {
        let store = MirrorStore::new();
        store.replace(vec![
            ManagedCluster::new("a")
                .with_creation_timestamp(Utc.timestamp_opt(1_600_000_000, 0).unwrap())
                .with_label("vendor", "aws"),
            ManagedCluster::new("b").with_kubernetes_version("1.26"),
        ]);
        let families = generator(&store, Arc::new(StaticDeploymentLookup::new(["b"])))
            .generate()
            .await;

        let total: usize = families.iter().map(|family| family.metrics.len()).sum();
        assert_eq!(total, 5);
        for family in &families {
            for metric in &family.metrics {
                assert_eq!(metric.label_keys()[0], CLUSTER_LABEL);
                assert_eq!(metric.label_keys().len(), metric.label_values().len());
                assert!(["a", "b"].contains(&metric.label_values()[0].as_str()));
            }
        }
        assert_eq!(families[0].metrics.len(), 1);
        assert_eq!(families[0].metrics[0].label_values()[0], "a");
    }

    #[tokio::test]
    async fn lookup_failure_only_drops_affected_sample() {
        let store = MirrorStore::new();
        store.replace(vec![ManagedCluster::new("bad"), ManagedCluster::new("good")]);
        let lookup = Arc::new(StaticDeploymentLookup::new(["good"]).failing_for("bad"));

        let families = generator(&store, lookup).generate().await;

        let labels = &families[1];
        assert_eq!(labels.metrics.len(), 1);
        assert_eq!(labels.metrics[0].label_values()[0], "good");
        assert_eq!(labels.metrics[0].label("created_via"), Some("hive"));
        assert_eq!(families[2].metrics.len(), 2);
    }

    #[tokio::test]
    async fn one_lookup_per_cluster_per_pass() {
        let store = MirrorStore::new();
        store.replace(vec![
            ManagedCluster::new("a"),
            ManagedCluster::new("b"),
            ManagedCluster::new("c"),
        ]);
        let lookup = Arc::new(StaticDeploymentLookup::default());
        let generator = generator(&store, lookup.clone());

        generator.generate().await;
        assert_eq!(lookup.calls(), 3);
        generator.generate().await;
        assert_eq!(lookup.calls(), 6);
    }

    #[tokio::test]
    async fn empty_mirror_yields_empty_families() {
        let store = MirrorStore::new();
        let families = generator(&store, Arc::new(StaticDeploymentLookup::default()))
            .generate()
            .await;
        assert_eq!(families.len(), 3);
        assert!(families.iter().all(MetricFamily::is_empty));
    }

    #[tokio::test]
    async fn delete_during_pass_keeps_whole_records() {
        let store = MirrorStore::new();
        store.replace(vec![
            ManagedCluster::new("c1")
                .with_creation_timestamp(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
                .with_label("vendor", "aws")
                .with_kubernetes_version("1.25"),
            ManagedCluster::new("c2"),
        ]);
        let lookup = Arc::new(PausingLookup::new("c1"));
        let generator = MetricsGenerator::new(
            store.clone(),
            managed_cluster_families(ManagedClusterDescriptors::default()),
            EnrichmentResolver::new(lookup.clone()),
        );

        let in_flight = tokio::spawn({
            let generator = generator.clone();
            async move { generator.generate().await }
        });
        lookup.entered.notified().await;
        store.apply(ClusterChange::Deleted(ManagedCluster::new("c1")));
        lookup.release.notify_one();
        let families = in_flight.await.unwrap();

        for family in &families {
            let c1: Vec<_> = family
                .metrics
                .iter()
                .filter(|metric| metric.label_values()[0] == "c1")
                .collect();
            assert_eq!(c1.len(), 1, "{} lost c1", family.name);
        }
        assert_eq!(families[0].metrics[0].value(), 1_700_000_000.0);
        assert_eq!(
            families[1].metrics[0].label_values(),
            ["c1", "aws", "", "imported", "1.25"]
        );
        assert_eq!(families[2].metrics[0].label_values(), ["c1", "aws", "", "1.25"]);

        let next = generator.generate().await;
        assert!(
            next.iter()
                .flat_map(|family| &family.metrics)
                .all(|metric| metric.label_values()[0] != "c1")
        );
        assert_eq!(next[1].metrics.len(), 1);
    }
}
