//! Command-line entrypoint wiring the mirror, generators and scrape server.

pub mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ocm_adapter_kube::KubeResourceClient;
use ocm_application::{
    EnrichmentResolver, ManagedClusterDescriptors, MetricsGenerator, MirrorSettings,
    ResourceMirror, managed_cluster_families,
};
use ocm_domain::ExporterConfig;
use ocm_ports::PortSet;

pub use args::Cli;

pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Parses the process arguments and runs until Ctrl-C.
pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ExporterConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;
    let addr = config.listen_addr()?;

    let client = ocm_adapter_kube::connect(
        config.kube.apiserver.as_deref(),
        config.kube.kubeconfig.as_deref(),
    )
    .await
    .context("cannot create ManagedCluster client")?;
    let ports = PortSet::new(Arc::new(KubeResourceClient::new(client)));

    let mirror = ResourceMirror::new(ports.clusters, MirrorSettings::from(&config.mirror));
    let generator = MetricsGenerator::new(
        mirror.store(),
        managed_cluster_families(ManagedClusterDescriptors::default()),
        EnrichmentResolver::new(ports.deployments),
    );
    let mut mirror_state = mirror.subscribe_state();
    tokio::spawn(async move {
        while mirror_state.changed().await.is_ok() {
            let state = *mirror_state.borrow_and_update();
            info!(?state, "Managed cluster mirror state changed");
        }
    });
    let mirror_task = tokio::spawn(mirror.run());

    let served = ocm_adapter_exposition::serve(
        addr,
        ocm_adapter_exposition::router(generator),
        shutdown_signal(),
    )
    .await;
    mirror_task.abort();
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(err) => {
            warn!("Failed to listen for shutdown signal: {err}");
            std::future::pending::<()>().await;
        }
    }
}
