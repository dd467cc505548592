//! Metric families derived from each managed cluster.

use anyhow::Result;
use async_trait::async_trait;

use ocm_domain::{FamilyDescriptor, ManagedCluster, Metric};

use crate::enrichment::EnrichmentResolver;
use crate::labels::LabelComposer;

const LABELS_FAMILY_KEYS: [&str; 4] = ["vendor", "cloud", "created_via", "version"];
const INFO_FAMILY_KEYS: [&str; 3] = ["vendor", "cloud", "version"];
const LABELS_HELP: &str = "Kubernetes labels converted to Prometheus labels.";

/// Maps one cluster to the samples of one family.
///
/// Implementations must not emit the cluster identity label; that is added
/// by [`FamilyGenerator::generate`].
#[async_trait]
pub trait Projection: Send + Sync {
    async fn project(
        &self,
        cluster: &ManagedCluster,
        resolver: &EnrichmentResolver,
    ) -> Result<Vec<Metric>>;
}

pub struct FamilyGenerator {
    descriptor: FamilyDescriptor,
    projection: Box<dyn Projection>,
}

impl FamilyGenerator {
    pub fn new(descriptor: FamilyDescriptor, projection: impl Projection + 'static) -> Self {
        Self {
            descriptor,
            projection: Box::new(projection),
        }
    }

    pub fn descriptor(&self) -> &FamilyDescriptor {
        &self.descriptor
    }

    pub async fn generate(
        &self,
        cluster: &ManagedCluster,
        resolver: &EnrichmentResolver,
    ) -> Result<Vec<Metric>> {
        let metrics = self.projection.project(cluster, resolver).await?;
        Ok(LabelComposer::compose(cluster, metrics))
    }
}

/// Descriptors for the standard managed cluster families.
#[derive(Debug, Clone)]
pub struct ManagedClusterDescriptors {
    pub created: FamilyDescriptor,
    pub labels: FamilyDescriptor,
    pub info: FamilyDescriptor,
}

impl Default for ManagedClusterDescriptors {
    fn default() -> Self {
        Self {
            created: FamilyDescriptor::gauge("ocm_managedcluster_created", "Unix creation timestamp"),
            labels: FamilyDescriptor::gauge("ocm_managedcluster_labels", LABELS_HELP),
            info: FamilyDescriptor::gauge("ocm_managedcluster_info", LABELS_HELP),
        }
    }
}

/// The created, labels and info families, in that order.
pub fn managed_cluster_families(descriptors: ManagedClusterDescriptors) -> Vec<FamilyGenerator> {
    vec![
        FamilyGenerator::new(descriptors.created, CreatedTimestamp),
        FamilyGenerator::new(descriptors.labels, ClusterLabels),
        FamilyGenerator::new(descriptors.info, ClusterInfo),
    ]
}

/// Creation time in epoch seconds; nothing until the hub stamps it.
pub struct CreatedTimestamp;

#[async_trait]
impl Projection for CreatedTimestamp {
    async fn project(
        &self,
        cluster: &ManagedCluster,
        _resolver: &EnrichmentResolver,
    ) -> Result<Vec<Metric>> {
        Ok(cluster
            .created_epoch_seconds()
            .map(|seconds| Metric::new(seconds as f64))
            .into_iter()
            .collect())
    }
}

/// Vendor, cloud, provenance and version; needs a ClusterDeployment lookup.
pub struct ClusterLabels;

#[async_trait]
impl Projection for ClusterLabels {
    async fn project(
        &self,
        cluster: &ManagedCluster,
        resolver: &EnrichmentResolver,
    ) -> Result<Vec<Metric>> {
        let created_via = resolver.classify(&cluster.name).await?;
        let values = [
            cluster.label("vendor"),
            cluster.label("cloud"),
            created_via.as_str(),
            cluster.kubernetes_version.as_str(),
        ];
        Ok(vec![Metric::new(1.0).with_labels(LABELS_FAMILY_KEYS, values)])
    }
}

/// Same as [`ClusterLabels`] minus provenance, so it never hits the API.
pub struct ClusterInfo;

#[async_trait]
impl Projection for ClusterInfo {
    async fn project(
        &self,
        cluster: &ManagedCluster,
        _resolver: &EnrichmentResolver,
    ) -> Result<Vec<Metric>> {
        let values = [
            cluster.label("vendor"),
            cluster.label("cloud"),
            cluster.kubernetes_version.as_str(),
        ];
        Ok(vec![Metric::new(1.0).with_labels(INFO_FAMILY_KEYS, values)])
    }
}
