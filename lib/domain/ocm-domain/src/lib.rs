//! Domain models and invariants.

pub mod cluster;
pub mod config;
pub mod metrics;
pub mod watch;

pub use cluster::ManagedCluster;
pub use config::{ExporterConfig, KubeConfig, MirrorConfig, ServerConfig};
pub use metrics::{FamilyDescriptor, Metric, MetricFamily, MetricType};
pub use watch::{ClusterChange, ClusterList, Selector, WatchEvent};
