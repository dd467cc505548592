use std::path::PathBuf;

use clap::Parser;

use ocm_domain::ExporterConfig;

/// Publishes ManagedCluster state as Prometheus metrics.
#[derive(Debug, Parser)]
#[command(name = "ocm-metrics", version)]
pub struct Cli {
    /// YAML configuration file.
    #[arg(long, env = "OCM_METRICS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hub API server URL; overrides the kubeconfig server.
    #[arg(long, env = "OCM_APISERVER")]
    pub apiserver: Option<String>,

    /// Kubeconfig file; in-cluster config is used when omitted.
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Address the scrape endpoint listens on.
    #[arg(long, env = "OCM_METRICS_LISTEN")]
    pub listen: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags win over the configuration file.
    pub fn apply(&self, config: &mut ExporterConfig) {
        if let Some(apiserver) = &self.apiserver {
            config.kube.apiserver = Some(apiserver.clone());
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            config.kube.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
    }
}
