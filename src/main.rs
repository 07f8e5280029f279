// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use helm_exporter::charts::{ChartVersionResolver, HelmRegistries};
use helm_exporter::config::{FileConfig, Settings};
use helm_exporter::constants::LISTEN_PORT;
use helm_exporter::kubernetes::{namespace_events, KubeClientFactory};
use helm_exporter::metrics::{MetricsPublisher, ScanMode};
use helm_exporter::registry::ClientRegistry;
use helm_exporter::scanner::ReleaseScanner;
use helm_exporter::server;
use helm_exporter::watcher::NamespaceWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();

    // Initialize tracing, RUST_LOG wins over --verbose
    let default_level = if settings.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Helm exporter");

    let interval = settings
        .interval()
        .with_context(|| format!("invalid duration `{}`", settings.interval_duration))?;
    let file_config = FileConfig::load(&settings.config).context("Failed to load config file")?;
    let ignore = settings.ignore_patterns();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let clients = ClientRegistry::new();
    let factory = Arc::new(KubeClientFactory::new(client.clone(), &settings.helm_driver));
    let watcher = Arc::new(NamespaceWatcher::new(clients.clone(), factory, ignore));

    let resolver: Option<Arc<dyn ChartVersionResolver>> = if settings.latest_chart_version {
        Some(Arc::new(HelmRegistries::new(file_config.helm_registries)?))
    } else {
        None
    };
    let publisher = Arc::new(MetricsPublisher::new(
        clients,
        ReleaseScanner::new(resolver),
        settings.toggles(),
        ScanMode::from_interval(interval),
    )?);

    let cancel = CancellationToken::new();

    match settings.static_namespaces() {
        Some(namespaces) => watcher.connect_all(&namespaces).await,
        None => {
            let watcher = watcher.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.watch(namespace_events(client), cancel).await });
        }
    }

    {
        let publisher = publisher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { publisher.run(cancel).await });
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal");
            cancel.cancel();
        });
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], LISTEN_PORT));
    server::listen(addr, publisher, cancel)
        .await
        .with_context(|| format!("HTTP server on {} failed", addr))?;

    info!("Helm exporter stopped");
    Ok(())
}
