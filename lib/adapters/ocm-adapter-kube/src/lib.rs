//! Kubernetes API adapter for the managed cluster ports.

pub mod manifest;

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use kube::Client;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams, WatchParams};
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use tracing::{debug, info, warn};

use ocm_domain::{ClusterList, Selector};
use ocm_ports::{ClusterDeploymentLookup, ManagedClusterSource, WatchStream};

use crate::manifest::{decode_managed_cluster, decode_watch_event};

/// Server-side watch timeout; must stay below the API server's 295s cap.
const WATCH_TIMEOUT_SECS: u32 = 290;

/// Builds a client from a kubeconfig file, or from the in-cluster or
/// default environment when no file is given, optionally pointing it at a
/// different API server.
pub async fn connect(apiserver: Option<&str>, kubeconfig: Option<&Path>) -> Result<Client> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig at {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .with_context(|| format!("invalid kubeconfig at {}", path.display()))?
        }
        None => Config::infer()
            .await
            .context("failed to infer kubernetes client config")?,
    };

    if let Some(apiserver) = apiserver {
        config.cluster_url = apiserver
            .parse::<http::Uri>()
            .with_context(|| format!("invalid apiserver url {apiserver}"))?;
    }

    info!(cluster_url = %config.cluster_url, "Connecting to hub API server");
    Client::try_from(config).context("failed to build kubernetes client")
}

fn managed_cluster_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        "cluster.open-cluster-management.io",
        "v1",
        "ManagedCluster",
    ))
}

fn cluster_deployment_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        "hive.openshift.io",
        "v1",
        "ClusterDeployment",
    ))
}

/// Lists and watches ManagedClusters and looks up Hive ClusterDeployments.
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
    managed_clusters: ApiResource,
    cluster_deployments: ApiResource,
}

impl KubeResourceClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            managed_clusters: managed_cluster_resource(),
            cluster_deployments: cluster_deployment_resource(),
        }
    }

    fn managed_clusters(&self) -> Api<DynamicObject> {
        Api::all_with(self.client.clone(), &self.managed_clusters)
    }

    fn cluster_deployments(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.cluster_deployments)
    }
}

fn list_params(selector: &Selector) -> ListParams {
    let mut params = ListParams::default();
    params.label_selector = selector.label_selector.clone();
    params.field_selector = selector.field_selector.clone();
    params
}

fn watch_params(selector: &Selector) -> WatchParams {
    let mut params = WatchParams::default().timeout(WATCH_TIMEOUT_SECS);
    params.label_selector = selector.label_selector.clone();
    params.field_selector = selector.field_selector.clone();
    params
}

#[async_trait]
impl ManagedClusterSource for KubeResourceClient {
    async fn list(&self, selector: &Selector) -> Result<ClusterList> {
        let list = self
            .managed_clusters()
            .list(&list_params(selector))
            .await
            .context("ManagedCluster list request failed")?;

        let mut items = Vec::with_capacity(list.items.len());
        for object in &list.items {
            match decode_managed_cluster(object) {
                Ok(cluster) => items.push(cluster),
                Err(err) => warn!("Ignoring undecodable ManagedCluster: {err:#}"),
            }
        }

        Ok(ClusterList {
            items,
            resource_version: list.metadata.resource_version.unwrap_or_default(),
        })
    }

    async fn watch(&self, selector: &Selector, resource_version: &str) -> Result<WatchStream> {
        let events = self
            .managed_clusters()
            .watch(&watch_params(selector), resource_version)
            .await
            .context("ManagedCluster watch request failed")?;
        debug!(%resource_version, "Opened ManagedCluster watch");

        Ok(events
            .map(|event| {
                event
                    .context("ManagedCluster watch stream failed")
                    .and_then(decode_watch_event)
            })
            .boxed())
    }
}

#[async_trait]
impl ClusterDeploymentLookup for KubeResourceClient {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let found = self
            .cluster_deployments(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("failed to get ClusterDeployment {namespace}/{name}"))?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_use_expected_plurals() {
        assert_eq!(managed_cluster_resource().plural, "managedclusters");
        assert_eq!(
            managed_cluster_resource().api_version,
            "cluster.open-cluster-management.io/v1"
        );
        assert_eq!(cluster_deployment_resource().plural, "clusterdeployments");
        assert_eq!(cluster_deployment_resource().group, "hive.openshift.io");
    }

    #[test]
    fn selectors_reach_request_params() {
        let selector = Selector {
            label_selector: Some("vendor=OpenShift".to_string()),
            field_selector: None,
        };
        let list = list_params(&selector);
        let watch = watch_params(&selector);

        assert_eq!(list.label_selector.as_deref(), Some("vendor=OpenShift"));
        assert_eq!(watch.label_selector.as_deref(), Some("vendor=OpenShift"));
        assert_eq!(watch.timeout, Some(WATCH_TIMEOUT_SECS));
        assert!(watch.field_selector.is_none());
    }
}
