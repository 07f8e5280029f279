// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The gauge families produced by a scan

use crate::constants::metrics::*;
use crate::error::Result;
use crate::scanner::ReleaseRecord;
use prometheus::{GaugeVec, Opts, Registry};
use tracing::debug;

/// Which gauge families are produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricToggles {
    pub info: bool,
    pub timestamp: bool,
    pub outdated: bool,
}

impl Default for MetricToggles {
    fn default() -> Self {
        Self {
            info: true,
            timestamp: true,
            outdated: true,
        }
    }
}

/// One generation of exported release metrics.
///
/// Disabled families are never allocated. Clones share the underlying gauges.
#[derive(Clone, Debug)]
pub struct MetricCollection {
    info: Option<GaugeVec>,
    timestamp: Option<GaugeVec>,
    outdated: Option<GaugeVec>,
}

fn gauge_vec(enabled: bool, name: &str, help: &str, labels: &[&str]) -> Result<Option<GaugeVec>> {
    if !enabled {
        return Ok(None);
    }
    Ok(Some(GaugeVec::new(Opts::new(name, help), labels)?))
}

impl MetricCollection {
    pub fn new(toggles: MetricToggles) -> Result<Self> {
        Ok(Self {
            info: gauge_vec(toggles.info, INFO_NAME, INFO_HELP, INFO_LABELS)?,
            timestamp: gauge_vec(
                toggles.timestamp,
                TIMESTAMP_NAME,
                TIMESTAMP_HELP,
                TIMESTAMP_LABELS,
            )?,
            outdated: gauge_vec(toggles.outdated, OUTDATED_NAME, OUTDATED_HELP, OUTDATED_LABELS)?,
        })
    }

    fn families(&self) -> impl Iterator<Item = &GaugeVec> {
        [&self.info, &self.timestamp, &self.outdated]
            .into_iter()
            .flatten()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.families().next().is_none()
    }

    /// Whether outdated rows are wanted at all
    pub fn tracks_outdated(&self) -> bool {
        self.outdated.is_some()
    }

    /// Drop every row from all families
    pub fn reset(&self) {
        self.families().for_each(GaugeVec::reset);
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        for family in self.families() {
            registry.register(Box::new(family.clone()))?;
        }
        Ok(())
    }

    pub fn unregister(&self, registry: &Registry) {
        for family in self.families() {
            if let Err(e) = registry.unregister(Box::new(family.clone())) {
                debug!("Metric family was not registered: {}", e);
            }
        }
    }

    /// Add the info and timestamp rows for a release
    pub fn record(&self, release: &ReleaseRecord) {
        let updated = release.updated_millis.to_string();

        if let Some(info) = &self.info {
            let revision = release.revision.to_string();
            info.with_label_values(&[
                &release.chart,
                &release.release,
                &release.version,
                &release.app_version,
                &revision,
                &updated,
                &release.namespace,
                &release.latest_version,
                &release.description,
            ])
            .set(release.status.code());
        }

        if let Some(timestamp) = &self.timestamp {
            timestamp
                .with_label_values(&[
                    &release.chart,
                    &release.release,
                    &release.version,
                    &release.app_version,
                    &updated,
                    &release.namespace,
                    &release.latest_version,
                ])
                .set(release.updated_millis as f64);
        }
    }

    /// Flag a release as running an outdated chart
    pub fn record_outdated(&self, release: &ReleaseRecord) {
        if let Some(outdated) = &self.outdated {
            outdated
                .with_label_values(&[
                    &release.chart,
                    &release.release,
                    &release.version,
                    &release.namespace,
                    &release.latest_version,
                ])
                .set(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helm::ReleaseStatus;
    use prometheus::{Encoder, TextEncoder};

    fn record() -> ReleaseRecord {
        ReleaseRecord {
            chart: "nginx".to_string(),
            release: "web".to_string(),
            version: "1.0.0".to_string(),
            app_version: "1.25.3".to_string(),
            revision: 4,
            updated_millis: 1_709_382_645_000,
            namespace: "apps".to_string(),
            status: ReleaseStatus::Failed,
            description: "Upgrade failed".to_string(),
            latest_version: "1.1.0".to_string(),
        }
    }

    fn render(collection: &MetricCollection) -> String {
        let registry = Registry::new();
        collection.register(&registry).unwrap();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_rows_use_fixed_labels() {
        let collection = MetricCollection::new(MetricToggles::default()).unwrap();
        collection.record(&record());
        collection.record_outdated(&record());

        let out = render(&collection);

        assert!(out.contains(
            r#"helm_chart_info{appVersion="1.25.3",chart="nginx",description="Upgrade failed",latestVersion="1.1.0",namespace="apps",release="web",revision="4",updated="1709382645000",version="1.0.0"} -1"#
        ));
        assert!(out.contains(
            r#"helm_chart_timestamp{appVersion="1.25.3",chart="nginx",latestVersion="1.1.0",namespace="apps",release="web",updated="1709382645000",version="1.0.0"} 1709382645000"#
        ));
        assert!(out.contains(
            r#"helm_chart_outdated{chart="nginx",latestVersion="1.1.0",namespace="apps",release="web",version="1.0.0"} 1"#
        ));
    }

    #[test]
    fn test_disabled_families_absent() {
        let collection = MetricCollection::new(MetricToggles {
            info: true,
            timestamp: false,
            outdated: false,
        })
        .unwrap();
        collection.record(&record());
        collection.record_outdated(&record());

        let out = render(&collection);

        assert!(out.contains("helm_chart_info"));
        assert!(!out.contains("helm_chart_timestamp"));
        assert!(!out.contains("helm_chart_outdated"));
        assert!(!collection.tracks_outdated());
    }

    #[test]
    fn test_all_disabled_is_empty() {
        let collection = MetricCollection::new(MetricToggles {
            info: false,
            timestamp: false,
            outdated: false,
        })
        .unwrap();

        assert!(collection.is_empty());
        assert_eq!(render(&collection), "");
    }

    #[test]
    fn test_reset_clears_rows() {
        let collection = MetricCollection::new(MetricToggles::default()).unwrap();
        collection.record(&record());
        collection.reset();

        assert!(!render(&collection).contains("nginx"));
    }

    #[test]
    fn test_unregister_allows_new_generation() {
        let registry = Registry::new();
        let first = MetricCollection::new(MetricToggles::default()).unwrap();
        first.register(&registry).unwrap();

        let second = MetricCollection::new(MetricToggles::default()).unwrap();
        assert!(second.register(&registry).is_err());

        first.unregister(&registry);
        second.unregister(&registry);
        assert!(second.register(&registry).is_ok());
    }
}
