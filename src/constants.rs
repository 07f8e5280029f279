// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Port the exporter listens on
pub const LISTEN_PORT: u16 = 9571;

/// Exported metric families
pub mod metrics {
    pub const INFO_NAME: &str = "helm_chart_info";
    pub const INFO_HELP: &str = "Information on helm releases";
    pub const INFO_LABELS: &[&str] = &[
        "chart",
        "release",
        "version",
        "appVersion",
        "revision",
        "updated",
        "namespace",
        "latestVersion",
        "description",
    ];

    pub const TIMESTAMP_NAME: &str = "helm_chart_timestamp";
    pub const TIMESTAMP_HELP: &str = "Timestamps of helm releases";
    pub const TIMESTAMP_LABELS: &[&str] = &[
        "chart",
        "release",
        "version",
        "appVersion",
        "updated",
        "namespace",
        "latestVersion",
    ];

    pub const OUTDATED_NAME: &str = "helm_chart_outdated";
    pub const OUTDATED_HELP: &str = "Outdated helm versions of helm releases";
    pub const OUTDATED_LABELS: &[&str] =
        &["chart", "release", "version", "namespace", "latestVersion"];
}

/// Helm release storage conventions
pub mod storage {
    /// Label selector matching objects owned by Helm
    pub const OWNER_SELECTOR: &str = "owner=helm";
    /// Data key holding the encoded release
    pub const RELEASE_KEY: &str = "release";
    /// Leading bytes of a gzip stream
    pub const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b, 0x08];
}

/// Chart registry lookups
pub mod registry {
    pub const ARTIFACT_HUB_API: &str = "https://artifacthub.io/api/v1/packages/helm";
    pub const INDEX_FILE: &str = "index.yaml";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}
