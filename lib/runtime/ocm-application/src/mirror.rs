//! List+watch loop keeping a [`MirrorStore`] in step with the hub.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use ocm_domain::{MirrorConfig, Selector};
use ocm_ports::ManagedClusterSource;

use crate::backoff::Backoff;
use crate::store::MirrorStore;

/// A watch that stays open this long counts as healthy even without events.
const MIN_HEALTHY_WATCH: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    Initializing,
    Listing,
    Watching,
    Reconnecting,
}

#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub selector: Selector,
    pub resync_interval: Option<Duration>,
    pub backoff: Backoff,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self::from(&MirrorConfig::default())
    }
}

impl From<&MirrorConfig> for MirrorSettings {
    fn from(config: &MirrorConfig) -> Self {
        Self {
            selector: Selector {
                label_selector: config.label_selector.clone(),
                field_selector: config.field_selector.clone(),
            },
            resync_interval: config.resync_interval(),
            backoff: Backoff::new(config.backoff_initial(), config.backoff_max()),
        }
    }
}

/// Why a watch session ended without an error.
enum WatchExit {
    ResyncDue,
}

pub struct ResourceMirror {
    source: Arc<dyn ManagedClusterSource>,
    store: MirrorStore,
    settings: MirrorSettings,
    state: watch::Sender<MirrorState>,
}

impl ResourceMirror {
    pub fn new(source: Arc<dyn ManagedClusterSource>, settings: MirrorSettings) -> Self {
        let (state, _) = watch::channel(MirrorState::Initializing);
        Self {
            source,
            store: MirrorStore::new(),
            settings,
            state,
        }
    }

    pub fn store(&self) -> MirrorStore {
        self.store.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MirrorState> {
        self.state.subscribe()
    }

    /// Runs for the lifetime of the process; stop it by aborting the task.
    pub async fn run(mut self) {
        loop {
            self.set_state(MirrorState::Listing);
            let resource_version = match self.relist().await {
                Ok(resource_version) => resource_version,
                Err(err) => {
                    self.reconnect(err).await;
                    continue;
                }
            };

            match self.watch_from(resource_version).await {
                Ok(WatchExit::ResyncDue) => {
                    info!("Resync interval elapsed, relisting managed clusters");
                }
                Err(err) => self.reconnect(err).await,
            }
        }
    }

    /// Replaces the snapshot with a fresh listing and returns its version.
    pub async fn relist(&self) -> Result<String> {
        let list = self
            .source
            .list(&self.settings.selector)
            .await
            .context("failed to list managed clusters")?;
        let count = list.items.len();
        self.store.replace(list.items);
        info!(
            count,
            resource_version = %list.resource_version,
            "Listed managed clusters"
        );
        Ok(list.resource_version)
    }

    /// Backoff resets once a session delivers an event or outlives
    /// [`MIN_HEALTHY_WATCH`]; sessions that close early and empty are
    /// reopened only after a backoff delay.
    async fn watch_from(&mut self, mut resource_version: String) -> Result<WatchExit> {
        self.set_state(MirrorState::Watching);
        let resync = self.settings.resync_interval;
        let resync_due = async move {
            match resync {
                Some(interval) => sleep(interval).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(resync_due);

        loop {
            let mut events = self
                .source
                .watch(&self.settings.selector, &resource_version)
                .await
                .with_context(|| format!("failed to watch managed clusters from {resource_version}"))?;
            let opened = Instant::now();
            let mut received = false;

            loop {
                tokio::select! {
                    _ = &mut resync_due => return Ok(WatchExit::ResyncDue),
                    next = events.next() => match next {
                        Some(Ok(event)) => {
                            debug!(change = ?event.change, "Managed cluster watch event");
                            if !received {
                                received = true;
                                self.settings.backoff.reset();
                            }
                            if let Some(version) = event.resource_version {
                                resource_version = version;
                            }
                            self.store.apply(event.change);
                        }
                        Some(Err(err)) => return Err(err.context("managed cluster watch stream failed")),
                        None => break,
                    }
                }
            }

            if received || opened.elapsed() >= MIN_HEALTHY_WATCH {
                self.settings.backoff.reset();
                debug!(%resource_version, "Watch stream closed by server, resuming");
            } else {
                let delay = self.settings.backoff.next_delay();
                debug!(%resource_version, ?delay, "Watch stream closed early without events");
                tokio::select! {
                    _ = &mut resync_due => return Ok(WatchExit::ResyncDue),
                    _ = sleep(delay) => {}
                }
            }
        }
    }

    async fn reconnect(&mut self, err: anyhow::Error) {
        self.set_state(MirrorState::Reconnecting);
        let delay = self.settings.backoff.next_delay();
        warn!(?delay, "Managed cluster mirror reconnecting: {err:#}");
        sleep(delay).await;
    }

    fn set_state(&self, state: MirrorState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}
