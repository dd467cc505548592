//! Managed cluster records as mirrored from the hub.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `ManagedCluster` as seen by the mirror.
///
/// `name` is the identity key and never changes for the lifetime of the
/// record; every other field may be replaced by a watch-modify event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedCluster {
    pub name: String,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub kubernetes_version: String,
}

impl ManagedCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_timestamp: None,
            labels: BTreeMap::new(),
            kubernetes_version: String::new(),
        }
    }

    pub fn with_creation_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.creation_timestamp = Some(timestamp);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_kubernetes_version(mut self, version: impl Into<String>) -> Self {
        self.kubernetes_version = version.into();
        self
    }

    /// Label value for `key`, or the empty string when the label is absent.
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or("")
    }

    /// Creation time in whole seconds since the Unix epoch.
    ///
    /// Returns `None` while the hub has not stamped the record yet; a zero
    /// timestamp counts as not stamped.
    pub fn created_epoch_seconds(&self) -> Option<i64> {
        self.creation_timestamp
            .map(|timestamp| timestamp.timestamp())
            .filter(|seconds| *seconds != 0)
    }
}
