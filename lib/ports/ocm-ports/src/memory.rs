//! In-memory port implementations for tests and local runs.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use ocm_domain::{ClusterList, ManagedCluster, Selector, WatchEvent};

use crate::{ClusterDeploymentLookup, ManagedClusterSource, WatchStream};

/// One scripted item of a fake watch stream.
#[derive(Debug, Clone)]
pub enum WatchStep {
    Event(WatchEvent),
    Fail(String),
}

/// Serves a fixed listing and a queue of scripted watch streams.
///
/// Each `watch` call pops the next script; a script is played to its end
/// and the stream then closes. Once the queue is empty, `watch` returns a
/// stream that never yields.
#[derive(Debug, Default)]
pub struct InMemoryClusterSource {
    items: Mutex<Vec<ManagedCluster>>,
    resource_version: Mutex<String>,
    list_failures: Mutex<VecDeque<String>>,
    watch_scripts: Mutex<VecDeque<Vec<WatchStep>>>,
    watch_versions: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
}

impl InMemoryClusterSource {
    pub fn new(items: Vec<ManagedCluster>, resource_version: impl Into<String>) -> Self {
        let source = Self::default();
        *source.items.lock().expect("items lock poisoned") = items;
        *source
            .resource_version
            .lock()
            .expect("resource version lock poisoned") = resource_version.into();
        source
    }

    pub fn set_items(&self, items: Vec<ManagedCluster>, resource_version: impl Into<String>) {
        *self.items.lock().expect("items lock poisoned") = items;
        *self
            .resource_version
            .lock()
            .expect("resource version lock poisoned") = resource_version.into();
    }

    pub fn fail_next_list(&self, message: impl Into<String>) {
        self.list_failures
            .lock()
            .expect("list failures lock poisoned")
            .push_back(message.into());
    }

    pub fn push_watch(&self, steps: Vec<WatchStep>) {
        self.watch_scripts
            .lock()
            .expect("watch scripts lock poisoned")
            .push_back(steps);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Resource versions passed to every `watch` call so far.
    pub fn watch_versions(&self) -> Vec<String> {
        self.watch_versions
            .lock()
            .expect("watch versions lock poisoned")
            .clone()
    }
}

#[async_trait]
impl ManagedClusterSource for InMemoryClusterSource {
    async fn list(&self, _selector: &Selector) -> Result<ClusterList> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self
            .list_failures
            .lock()
            .expect("list failures lock poisoned")
            .pop_front()
        {
            bail!(message);
        }
        Ok(ClusterList {
            items: self.items.lock().expect("items lock poisoned").clone(),
            resource_version: self
                .resource_version
                .lock()
                .expect("resource version lock poisoned")
                .clone(),
        })
    }

    async fn watch(&self, _selector: &Selector, resource_version: &str) -> Result<WatchStream> {
        self.watch_versions
            .lock()
            .expect("watch versions lock poisoned")
            .push(resource_version.to_string());
        let script = self
            .watch_scripts
            .lock()
            .expect("watch scripts lock poisoned")
            .pop_front();
        match script {
            Some(steps) => Ok(stream::iter(steps.into_iter().map(|step| match step {
                WatchStep::Event(event) => Ok(event),
                WatchStep::Fail(message) => Err(anyhow!(message)),
            }))
            .boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}

/// Answers existence checks from a fixed set of names.
///
/// Lookups follow the namespace-per-cluster convention, so an entry `x`
/// matches namespace `x`, name `x`.
#[derive(Debug, Default)]
pub struct StaticDeploymentLookup {
    existing: BTreeSet<String>,
    failing: BTreeSet<String>,
    calls: AtomicUsize,
}

impl StaticDeploymentLookup {
    pub fn new<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            existing: existing.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Makes lookups for `name` fail with a non-not-found error.
    pub fn failing_for(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterDeploymentLookup for StaticDeploymentLookup {
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(name) {
            bail!("clusterdeployments.hive.openshift.io \"{name}\" is forbidden");
        }
        Ok(namespace == name && self.existing.contains(name))
    }
}
