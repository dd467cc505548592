//! Mirror and metric generation pipeline for managed clusters.

pub mod backoff;
pub mod enrichment;
pub mod families;
pub mod generator;
pub mod labels;
pub mod mirror;
pub mod store;

pub use backoff::Backoff;
pub use enrichment::{EnrichmentResolver, Provenance};
pub use families::{
    FamilyGenerator, ManagedClusterDescriptors, Projection, managed_cluster_families,
};
pub use generator::MetricsGenerator;
pub use labels::{CLUSTER_LABEL, LabelComposer};
pub use mirror::{MirrorSettings, MirrorState, ResourceMirror};
pub use store::MirrorStore;
