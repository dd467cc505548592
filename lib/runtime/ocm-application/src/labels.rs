use ocm_domain::{ManagedCluster, Metric};

pub const CLUSTER_LABEL: &str = "managedcluster";

/// Puts the owning cluster's identity in front of every sample.
///
/// Applied once at the family boundary, so projections never handle the
/// identity label themselves.
pub struct LabelComposer;

impl LabelComposer {
    pub fn compose(cluster: &ManagedCluster, mut metrics: Vec<Metric>) -> Vec<Metric> {
        for metric in &mut metrics {
            metric.prepend_label(CLUSTER_LABEL, cluster.name.as_str());
        }
        metrics
    }
}
