// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns the releases of every registered namespace into metric rows.

use crate::charts::{is_outdated, ChartVersionResolver};
use crate::helm::{ClientHandle, Release, ReleaseStatus};
use crate::metrics::MetricCollection;
use std::sync::Arc;
use tracing::{debug, info_span, instrument, warn, Instrument};

/// Flattened view of a release as exported
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRecord {
    pub chart: String,
    pub release: String,
    pub version: String,
    pub app_version: String,
    pub revision: i64,
    pub updated_millis: i64,
    pub namespace: String,
    pub status: ReleaseStatus,
    pub description: String,
    pub latest_version: String,
}

impl From<&Release> for ReleaseRecord {
    fn from(release: &Release) -> Self {
        Self {
            chart: release.chart_name().to_string(),
            release: release.name.clone(),
            version: release.chart_version().to_string(),
            app_version: release.app_version().to_string(),
            revision: release.version,
            updated_millis: release.last_deployed_millis(),
            namespace: release.namespace.clone(),
            status: release.status(),
            description: release.description().to_string(),
            latest_version: String::new(),
        }
    }
}

/// Counters describing one scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub namespaces: usize,
    pub failed_namespaces: usize,
    pub releases: usize,
    pub outdated: usize,
}

pub struct ReleaseScanner {
    resolver: Option<Arc<dyn ChartVersionResolver>>,
}

impl ReleaseScanner {
    /// Without a resolver no latest versions are looked up
    pub fn new(resolver: Option<Arc<dyn ChartVersionResolver>>) -> Self {
        Self { resolver }
    }

    /// Populate `collection` from every client in `clients`.
    ///
    /// A namespace that cannot be listed is skipped; the rest of the scan goes on.
    #[instrument(skip_all, fields(namespaces = clients.len()))]
    pub async fn scan(
        &self,
        clients: &[(String, ClientHandle)],
        collection: &MetricCollection,
    ) -> ScanSummary {
        let mut summary = ScanSummary::default();

        for (namespace, client) in clients {
            summary.namespaces += 1;

            let releases = match client
                .list_releases()
                .instrument(info_span!("list_releases", namespace = %namespace))
                .await
            {
                Ok(releases) => releases,
                Err(e) => {
                    warn!("Got error while listing releases in {}: {}", namespace, e);
                    summary.failed_namespaces += 1;
                    continue;
                }
            };

            for release in &releases {
                let record = self.observe(release).await;
                summary.releases += 1;

                collection.record(&record);
                if collection.tracks_outdated()
                    && is_outdated(&record.version, &record.latest_version)
                {
                    collection.record_outdated(&record);
                    summary.outdated += 1;
                }
            }
        }

        debug!("Scan complete: {:?}", summary);
        summary
    }

    async fn observe(&self, release: &Release) -> ReleaseRecord {
        let mut record = ReleaseRecord::from(release);

        if let Some(resolver) = &self.resolver {
            record.latest_version = resolver.latest_version(&record.chart).await;
            debug!(
                chart = %record.chart,
                version = %record.version,
                latest = %record.latest_version,
                "Comparing versions"
            );
        }

        record
    }
}
