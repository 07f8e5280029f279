// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Scan scheduling and exposition of the current metric generation.

use crate::error::{ExporterError, Result};
use crate::metrics::{MetricCollection, MetricToggles};
use crate::registry::ClientRegistry;
use crate::scanner::{ReleaseScanner, ScanSummary};
use prometheus::{Encoder, Registry, TextEncoder};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// When scans happen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanMode {
    /// Background scans, scrapes serve the last published generation
    Interval(Duration),
    /// Every scrape rescans before answering
    OnDemand,
}

impl ScanMode {
    pub fn from_interval(interval: Duration) -> Self {
        if interval.is_zero() {
            ScanMode::OnDemand
        } else {
            ScanMode::Interval(interval)
        }
    }
}

/// Owns the exposition registry and the collection currently published in it
pub struct MetricsPublisher {
    registry: Registry,
    published: RwLock<Option<MetricCollection>>,
    on_demand: Mutex<()>,
    clients: ClientRegistry,
    scanner: ReleaseScanner,
    toggles: MetricToggles,
    mode: ScanMode,
}

impl MetricsPublisher {
    /// In on-demand mode the single collection is allocated and registered here
    pub fn new(
        clients: ClientRegistry,
        scanner: ReleaseScanner,
        toggles: MetricToggles,
        mode: ScanMode,
    ) -> Result<Self> {
        let registry = Registry::new();

        let published = match mode {
            ScanMode::OnDemand => {
                let collection = MetricCollection::new(toggles)?;
                collection.register(&registry)?;
                Some(collection)
            }
            ScanMode::Interval(_) => None,
        };

        Ok(Self {
            registry,
            published: RwLock::new(published),
            on_demand: Mutex::new(()),
            clients,
            scanner,
            toggles,
            mode,
        })
    }

    /// Periodically scan and publish until cancelled. Returns immediately in on-demand mode.
    pub async fn run(&self, cancel: CancellationToken) {
        let ScanMode::Interval(interval) = self.mode else {
            debug!("On-demand mode, no background scans");
            return;
        };

        info!("Scanning releases every {:?}", interval);
        loop {
            if let Err(e) = self.publish_once().await {
                error!("Failed to publish metrics: {}", e);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Stopping background scans");
                    return;
                }
                _ = sleep(interval) => {}
            }
        }
    }

    /// Build a fresh generation from the current registry and publish it
    #[instrument(skip(self))]
    pub async fn publish_once(&self) -> Result<ScanSummary> {
        let collection = MetricCollection::new(self.toggles)?;
        let summary = self.scanner.scan(&self.clients.snapshot(), &collection).await;
        self.swap(collection).await?;
        info!(
            "Published {} releases from {} namespaces",
            summary.releases, summary.namespaces
        );
        Ok(summary)
    }

    async fn swap(&self, next: MetricCollection) -> Result<()> {
        let mut published = self.published.write().await;
        if let Some(previous) = published.take() {
            previous.unregister(&self.registry);
        }
        next.register(&self.registry)?;
        *published = Some(next);
        Ok(())
    }

    /// Answer a scrape with the text exposition format
    pub async fn render(&self) -> Result<String> {
        let families = match self.mode {
            ScanMode::Interval(_) => {
                let _published = self.published.read().await;
                self.registry.gather()
            }
            ScanMode::OnDemand => {
                let _scan = self.on_demand.lock().await;
                let collection = self.published.read().await.clone();
                if let Some(collection) = collection {
                    collection.reset();
                    self.scanner.scan(&self.clients.snapshot(), &collection).await;
                }
                self.registry.gather()
            }
        };

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ExporterError::MetricsError(prometheus::Error::Msg(e.to_string())))
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}
