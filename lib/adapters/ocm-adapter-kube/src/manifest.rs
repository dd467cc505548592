//! Wire decoding of `ManagedCluster` objects.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use kube::api::{DynamicObject, WatchEvent as KubeWatchEvent};
use serde::Deserialize;

use ocm_domain::{ManagedCluster, WatchEvent};

#[derive(Debug, Deserialize)]
struct ManagedClusterManifest {
    metadata: ManifestMetadata,
    #[serde(default)]
    status: Option<ManifestStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ManifestStatus {
    #[serde(default)]
    version: Option<ManifestVersion>,
}

#[derive(Debug, Deserialize)]
struct ManifestVersion {
    #[serde(default)]
    kubernetes: Option<String>,
}

/// Decodes a raw `ManagedCluster` document.
pub fn decode_manifest(value: serde_json::Value) -> Result<ManagedCluster> {
    let manifest: ManagedClusterManifest =
        serde_json::from_value(value).context("malformed ManagedCluster")?;
    let name = manifest
        .metadata
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("ManagedCluster without metadata.name"))?;
    let kubernetes_version = manifest
        .status
        .and_then(|status| status.version)
        .and_then(|version| version.kubernetes)
        .unwrap_or_default();

    Ok(ManagedCluster {
        name,
        creation_timestamp: manifest.metadata.creation_timestamp,
        labels: manifest.metadata.labels.unwrap_or_default(),
        kubernetes_version,
    })
}

pub fn decode_managed_cluster(object: &DynamicObject) -> Result<ManagedCluster> {
    let value = serde_json::to_value(object).context("failed to serialize ManagedCluster")?;
    decode_manifest(value)
}

/// Converts a raw watch event; server-side `Error` events become errors.
pub fn decode_watch_event(event: KubeWatchEvent<DynamicObject>) -> Result<WatchEvent> {
    let (object, build): (DynamicObject, fn(ManagedCluster) -> WatchEvent) = match event {
        KubeWatchEvent::Added(object) => (object, WatchEvent::added),
        KubeWatchEvent::Modified(object) => (object, WatchEvent::modified),
        KubeWatchEvent::Deleted(object) => (object, WatchEvent::deleted),
        KubeWatchEvent::Bookmark(bookmark) => {
            return Ok(WatchEvent::bookmark(bookmark.metadata.resource_version));
        }
        KubeWatchEvent::Error(err) => {
            return Err(anyhow!("ManagedCluster watch returned an error: {err:?}"));
        }
    };
    let cluster = decode_managed_cluster(&object)?;
    let event = build(cluster);
    Ok(match object.metadata.resource_version {
        Some(version) => event.at_version(version),
        None => event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocm_domain::ClusterChange;
    use serde_json::json;

    fn managed_cluster_json() -> serde_json::Value {
        json!({
            "apiVersion": "cluster.open-cluster-management.io/v1",
            "kind": "ManagedCluster",
            "metadata": {
                "name": "c1",
                "resourceVersion": "4711",
                "creationTimestamp": "2024-03-01T12:00:00Z",
                "labels": {"vendor": "OpenShift", "cloud": "Amazon"}
            },
            "spec": {"hubAcceptsClient": true},
            "status": {"version": {"kubernetes": "v1.27.3"}}
        })
    }

    #[test]
    fn decodes_full_manifest() {
        let cluster = decode_manifest(managed_cluster_json()).unwrap();
        assert_eq!(cluster.name, "c1");
        assert_eq!(cluster.label("vendor"), "OpenShift");
        assert_eq!(cluster.label("cloud"), "Amazon");
        assert_eq!(cluster.kubernetes_version, "v1.27.3");
        assert_eq!(cluster.created_epoch_seconds(), Some(1_709_294_400));
    }

    #[test]
    fn tolerates_missing_status_and_labels() {
        let cluster = decode_manifest(json!({
            "metadata": {"name": "fresh", "labels": null}
        }))
        .unwrap();
        assert!(cluster.labels.is_empty());
        assert_eq!(cluster.kubernetes_version, "");
        assert_eq!(cluster.creation_timestamp, None);
    }

    #[test]
    fn rejects_nameless_objects() {
        assert!(decode_manifest(json!({"metadata": {}})).is_err());
    }

    #[test]
    fn watch_event_keeps_resource_version() {
        let object: DynamicObject = serde_json::from_value(managed_cluster_json()).unwrap();
        let event = decode_watch_event(KubeWatchEvent::Modified(object)).unwrap();

        assert_eq!(event.resource_version.as_deref(), Some("4711"));
        match event.change {
            ClusterChange::Modified(cluster) => assert_eq!(cluster.name, "c1"),
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn dynamic_object_round_trips_into_domain() {
        let object: DynamicObject = serde_json::from_value(managed_cluster_json()).unwrap();
        let cluster = decode_managed_cluster(&object).unwrap();
        assert_eq!(cluster.kubernetes_version, "v1.27.3");
        assert_eq!(cluster.labels.len(), 2);
    }
}
