//! Exporter configuration file model.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub kube: KubeConfig,
    pub server: ServerConfig,
    pub mirror: MirrorConfig,
}

/// Connection inputs, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeConfig {
    pub apiserver: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Full relist period; `0` disables periodic resync.
    pub resync_interval_secs: u64,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            resync_interval_secs: 300,
            backoff_initial_ms: 200,
            backoff_max_ms: 30_000,
            label_selector: None,
            field_selector: None,
        }
    }
}

impl MirrorConfig {
    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_interval_secs > 0).then(|| Duration::from_secs(self.resync_interval_secs))
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl ExporterConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .trim()
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.server.listen))
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.mirror.backoff_initial_ms == 0 {
            bail!("mirror.backoff_initial_ms must be greater than zero");
        }
        if self.mirror.backoff_max_ms < self.mirror.backoff_initial_ms {
            bail!(
                "mirror.backoff_max_ms ({}) is below mirror.backoff_initial_ms ({})",
                self.mirror.backoff_max_ms,
                self.mirror.backoff_initial_ms
            );
        }
        Ok(())
    }
}
