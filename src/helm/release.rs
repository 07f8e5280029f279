// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helm release documents as stored by the Helm storage drivers.

use crate::constants::storage::GZIP_MAGIC;
use crate::error::{ExporterError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fmt;
use std::io::Read;

/// Lifecycle state of a release revision
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(from = "String")]
pub enum ReleaseStatus {
    #[default]
    Unknown,
    Deployed,
    Uninstalled,
    Superseded,
    Failed,
    Uninstalling,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
}

impl ReleaseStatus {
    /// Numeric value exported as the info gauge
    pub fn code(self) -> f64 {
        match self {
            ReleaseStatus::Unknown => 0.0,
            ReleaseStatus::Deployed => 1.0,
            ReleaseStatus::Uninstalled => 2.0,
            ReleaseStatus::Superseded => 3.0,
            ReleaseStatus::Failed => -1.0,
            ReleaseStatus::Uninstalling => 5.0,
            ReleaseStatus::PendingInstall => 6.0,
            ReleaseStatus::PendingUpgrade => 7.0,
            ReleaseStatus::PendingRollback => 8.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseStatus::Unknown => "unknown",
            ReleaseStatus::Deployed => "deployed",
            ReleaseStatus::Uninstalled => "uninstalled",
            ReleaseStatus::Superseded => "superseded",
            ReleaseStatus::Failed => "failed",
            ReleaseStatus::Uninstalling => "uninstalling",
            ReleaseStatus::PendingInstall => "pending-install",
            ReleaseStatus::PendingUpgrade => "pending-upgrade",
            ReleaseStatus::PendingRollback => "pending-rollback",
        }
    }
}

impl From<&str> for ReleaseStatus {
    fn from(value: &str) -> Self {
        match value {
            "deployed" => ReleaseStatus::Deployed,
            "uninstalled" => ReleaseStatus::Uninstalled,
            "superseded" => ReleaseStatus::Superseded,
            "failed" => ReleaseStatus::Failed,
            "uninstalling" => ReleaseStatus::Uninstalling,
            "pending-install" => ReleaseStatus::PendingInstall,
            "pending-upgrade" => ReleaseStatus::PendingUpgrade,
            "pending-rollback" => ReleaseStatus::PendingRollback,
            _ => ReleaseStatus::Unknown,
        }
    }
}

impl From<String> for ReleaseStatus {
    fn from(value: String) -> Self {
        ReleaseStatus::from(value.as_str())
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single release revision
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Release {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Revision number
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub info: Option<ReleaseInfo>,
    #[serde(default)]
    pub chart: Option<Chart>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub last_deployed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ReleaseStatus,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Chart {
    #[serde(default)]
    pub metadata: Option<ChartMetadata>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub app_version: String,
}

impl Release {
    fn metadata(&self) -> Option<&ChartMetadata> {
        self.chart.as_ref().and_then(|c| c.metadata.as_ref())
    }

    pub fn chart_name(&self) -> &str {
        self.metadata().map(|m| m.name.as_str()).unwrap_or_default()
    }

    pub fn chart_version(&self) -> &str {
        self.metadata().map(|m| m.version.as_str()).unwrap_or_default()
    }

    pub fn app_version(&self) -> &str {
        self.metadata().map(|m| m.app_version.as_str()).unwrap_or_default()
    }

    pub fn status(&self) -> ReleaseStatus {
        self.info.as_ref().map(|i| i.status).unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.info.as_ref().map(|i| i.description.as_str()).unwrap_or_default()
    }

    /// Last deployment time in epoch milliseconds, truncated to whole seconds
    pub fn last_deployed_millis(&self) -> i64 {
        self.info
            .as_ref()
            .and_then(|i| i.last_deployed)
            .map(|t| t.timestamp() * 1000)
            .unwrap_or(0)
    }
}

/// Decode the `release` payload of a Helm storage object.
///
/// The payload is base64 text wrapping the release JSON, gzip-compressed by
/// every Helm 3 release but accepted uncompressed as well.
pub fn decode_release(object_name: &str, payload: &[u8]) -> Result<Release> {
    let decode_err = |reason: String| ExporterError::ReleaseDecode {
        name: object_name.to_string(),
        reason,
    };

    let trimmed = payload.trim_ascii();
    let raw = STANDARD
        .decode(trimmed)
        .map_err(|e| decode_err(format!("invalid base64: {}", e)))?;

    let json = if raw.starts_with(GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| decode_err(format!("invalid gzip stream: {}", e)))?;
        out
    } else {
        raw
    };

    serde_json::from_slice(&json).map_err(|e| decode_err(format!("invalid release json: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    pub(crate) fn release_json(name: &str, namespace: &str, revision: i64, status: &str) -> String {
        serde_json::json!({
            "name": name,
            "namespace": namespace,
            "version": revision,
            "info": {
                "first_deployed": "2024-03-01T10:00:00.000000000Z",
                "last_deployed": "2024-03-02T12:30:45.987654321Z",
                "deleted": "",
                "description": "Upgrade complete",
                "status": status
            },
            "chart": {
                "metadata": {
                    "name": "nginx",
                    "version": "1.0.0",
                    "appVersion": "1.25.3",
                    "apiVersion": "v2"
                }
            },
            "manifest": "---\n",
            "config": {}
        })
        .to_string()
    }

    /// Encode a release the way Helm writes it: gzip, then base64
    pub(crate) fn encode_payload(json: &str) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        STANDARD.encode(encoder.finish().unwrap())
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            ("deployed", 1.0),
            ("uninstalled", 2.0),
            ("superseded", 3.0),
            ("failed", -1.0),
            ("uninstalling", 5.0),
            ("pending-install", 6.0),
            ("pending-upgrade", 7.0),
            ("pending-rollback", 8.0),
            ("unknown", 0.0),
            ("something-new", 0.0),
            ("", 0.0),
        ];
        for (name, code) in cases {
            assert_eq!(ReleaseStatus::from(name).code(), code, "status {}", name);
        }
    }

    #[test]
    fn test_status_name_preserved() {
        assert_eq!(ReleaseStatus::from("pending-upgrade").to_string(), "pending-upgrade");
        assert_eq!(ReleaseStatus::from("bogus").to_string(), "unknown");
    }

    #[test]
    fn test_decode_gzipped_release() {
        let payload = encode_payload(&release_json("web", "apps", 3, "deployed"));

        let release = decode_release("sh.helm.release.v1.web.v3", payload.as_bytes()).unwrap();

        assert_eq!(release.name, "web");
        assert_eq!(release.namespace, "apps");
        assert_eq!(release.version, 3);
        assert_eq!(release.chart_name(), "nginx");
        assert_eq!(release.chart_version(), "1.0.0");
        assert_eq!(release.app_version(), "1.25.3");
        assert_eq!(release.status(), ReleaseStatus::Deployed);
        assert_eq!(release.description(), "Upgrade complete");
    }

    #[test]
    fn test_decode_plain_json_release() {
        let payload = STANDARD.encode(release_json("web", "apps", 1, "failed"));

        let release = decode_release("web", payload.as_bytes()).unwrap();

        assert_eq!(release.status(), ReleaseStatus::Failed);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_release("broken", b"%%% not base64 %%%").unwrap_err();
        assert!(matches!(err, ExporterError::ReleaseDecode { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_last_deployed_truncates_to_seconds() {
        let payload = encode_payload(&release_json("web", "apps", 1, "deployed"));
        let release = decode_release("web", payload.as_bytes()).unwrap();

        // 2024-03-02T12:30:45Z
        assert_eq!(release.last_deployed_millis(), 1_709_382_645_000);
    }

    #[test]
    fn test_missing_chart_and_info() {
        let release: Release = serde_json::from_str(r#"{"name":"bare"}"#).unwrap();

        assert_eq!(release.chart_name(), "");
        assert_eq!(release.app_version(), "");
        assert_eq!(release.status(), ReleaseStatus::Unknown);
        assert_eq!(release.last_deployed_millis(), 0);
    }
}
