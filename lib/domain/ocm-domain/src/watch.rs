//! List/watch payloads exchanged between the API adapter and the mirror.

use crate::cluster::ManagedCluster;

/// Optional server-side filters applied to both list and watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

/// Result of a full listing, with the token a watch resumes from.
#[derive(Debug, Clone, Default)]
pub struct ClusterList {
    pub items: Vec<ManagedCluster>,
    pub resource_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterChange {
    Added(ManagedCluster),
    Modified(ManagedCluster),
    Deleted(ManagedCluster),
    /// Progress marker with no object; only advances the resumption token.
    Bookmark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    pub resource_version: Option<String>,
    pub change: ClusterChange,
}

impl WatchEvent {
    pub fn added(cluster: ManagedCluster) -> Self {
        Self {
            resource_version: None,
            change: ClusterChange::Added(cluster),
        }
    }

    pub fn modified(cluster: ManagedCluster) -> Self {
        Self {
            resource_version: None,
            change: ClusterChange::Modified(cluster),
        }
    }

    pub fn deleted(cluster: ManagedCluster) -> Self {
        Self {
            resource_version: None,
            change: ClusterChange::Deleted(cluster),
        }
    }

    pub fn bookmark(resource_version: impl Into<String>) -> Self {
        Self {
            resource_version: Some(resource_version.into()),
            change: ClusterChange::Bookmark,
        }
    }

    pub fn at_version(mut self, resource_version: impl Into<String>) -> Self {
        self.resource_version = Some(resource_version.into());
        self
    }
}
