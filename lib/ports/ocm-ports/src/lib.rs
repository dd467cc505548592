//! Port traits between the metrics pipeline and the cluster API.

mod memory;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use ocm_domain::{ClusterList, Selector, WatchEvent};

pub use memory::{InMemoryClusterSource, StaticDeploymentLookup, WatchStep};

pub type WatchStream = BoxStream<'static, Result<WatchEvent>>;

/// List and watch access to the `ManagedCluster` collection.
#[async_trait]
pub trait ManagedClusterSource: Send + Sync {
    async fn list(&self, selector: &Selector) -> Result<ClusterList>;

    /// Opens a change stream starting after `resource_version`.
    ///
    /// The stream ends when the server closes it; an `Err` item means the
    /// stream is broken and the caller must relist.
    async fn watch(&self, selector: &Selector, resource_version: &str) -> Result<WatchStream>;
}

/// Point lookups against the `ClusterDeployment` collection.
#[async_trait]
pub trait ClusterDeploymentLookup: Send + Sync {
    /// `Ok(false)` when the server reports the object as not found; any
    /// other failure is an error.
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct PortSet {
    pub clusters: Arc<dyn ManagedClusterSource>,
    pub deployments: Arc<dyn ClusterDeploymentLookup>,
}

impl PortSet {
    pub fn new<C>(client: Arc<C>) -> Self
    where
        C: ManagedClusterSource + ClusterDeploymentLookup + 'static,
    {
        Self {
            clusters: client.clone(),
            deployments: client,
        }
    }
}
