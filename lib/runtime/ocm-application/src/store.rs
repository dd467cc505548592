//! Shared keyed snapshot of the mirrored collection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use ocm_domain::{ClusterChange, ManagedCluster};

/// Written by the mirror only; read by any number of generation passes.
///
/// Each mutation takes the write lock exactly once, so a reader sees a
/// record either entirely before or entirely after a change.
#[derive(Debug, Clone, Default)]
pub struct MirrorStore {
    clusters: Arc<RwLock<BTreeMap<String, Arc<ManagedCluster>>>>,
    synced: Arc<AtomicBool>,
}

impl MirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a complete listing.
    pub fn replace(&self, items: Vec<ManagedCluster>) {
        let fresh: BTreeMap<_, _> = items
            .into_iter()
            .map(|cluster| (cluster.name.clone(), Arc::new(cluster)))
            .collect();
        *self.clusters.write().expect("mirror store lock poisoned") = fresh;
        self.synced.store(true, Ordering::SeqCst);
    }

    pub fn apply(&self, change: ClusterChange) {
        let mut clusters = self.clusters.write().expect("mirror store lock poisoned");
        match change {
            ClusterChange::Added(cluster) | ClusterChange::Modified(cluster) => {
                clusters.insert(cluster.name.clone(), Arc::new(cluster));
            }
            ClusterChange::Deleted(cluster) => {
                clusters.remove(&cluster.name);
            }
            ClusterChange::Bookmark => {}
        }
    }

    /// Point-in-time view ordered by cluster name.
    pub fn snapshot(&self) -> Vec<Arc<ManagedCluster>> {
        self.clusters
            .read()
            .expect("mirror store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ManagedCluster>> {
        self.clusters
            .read()
            .expect("mirror store lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.clusters.read().expect("mirror store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once at least one full listing has been applied.
    pub fn has_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }
}
