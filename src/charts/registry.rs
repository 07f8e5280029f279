// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Latest chart version lookups against Helm repositories and ArtifactHub

use crate::charts::version::parse_version;
use crate::charts::ChartVersionResolver;
use crate::config::{RegistriesConfig, RegistryOverride};
use crate::constants::registry::{ARTIFACT_HUB_API, INDEX_FILE, REQUEST_TIMEOUT_SECS};
use crate::error::{ExporterError, Result};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Repository `index.yaml`, reduced to what version lookups need
#[derive(Deserialize, Debug, Default)]
pub struct RepoIndex {
    #[serde(default)]
    pub entries: HashMap<String, Vec<IndexEntry>>,
}

#[derive(Deserialize, Debug)]
pub struct IndexEntry {
    pub version: String,
}

#[derive(Deserialize, Debug)]
struct ArtifactHubPackage {
    #[serde(default)]
    version: String,
}

/// Resolver driven by the `helmRegistries` section of the config file
pub struct HelmRegistries {
    config: RegistriesConfig,
    http: reqwest::Client,
}

impl HelmRegistries {
    pub fn new(config: RegistriesConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ExporterError::RegistryError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { config, http })
    }

    #[instrument(skip(self))]
    async fn resolve(&self, chart: &str) -> String {
        let overrides = self.config.overrides.iter();
        for registry in overrides.filter(|r| r.charts.iter().any(|c| c == chart)) {
            match self.latest_from_index(registry, chart).await {
                Ok(Some(version)) => return version,
                Ok(None) => debug!("Chart {} not found in {}", chart, registry.registry.url),
                Err(e) => debug!("Failed to query {}: {}", registry.registry.url, e),
            }
        }

        for path in artifact_hub_paths(&self.config, chart) {
            match self.latest_from_artifact_hub(&path).await {
                Ok(Some(version)) => return version,
                Ok(None) => debug!("No version published for {}", path),
                Err(e) => debug!("Failed to query ArtifactHub for {}: {}", path, e),
            }
        }

        String::new()
    }

    async fn latest_from_index(
        &self,
        registry: &RegistryOverride,
        chart: &str,
    ) -> Result<Option<String>> {
        let url = index_url(&registry.registry.url)?;
        let body = self.get_text(url).await?;
        let index: RepoIndex = serde_yaml::from_str(&body)
            .map_err(|e| ExporterError::RegistryError(format!("Invalid repository index: {}", e)))?;

        Ok(latest_in_index(&index, chart, registry.allow_all_releases))
    }

    async fn latest_from_artifact_hub(&self, path: &str) -> Result<Option<String>> {
        let url = Url::parse(&format!("{}/{}", ARTIFACT_HUB_API, path))
            .map_err(|e| {
                ExporterError::RegistryError(format!("Invalid package path {}: {}", path, e))
            })?;
        let body = self.get_text(url).await?;
        let package: ArtifactHubPackage = serde_json::from_str(&body)
            .map_err(|e| {
                ExporterError::RegistryError(format!("Invalid ArtifactHub response: {}", e))
            })?;

        Ok(Some(package.version).filter(|v| !v.is_empty()))
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let registry_err = |e: reqwest::Error| ExporterError::RegistryError(e.to_string());
        self.http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(registry_err)?
            .text()
            .await
            .map_err(registry_err)
    }
}

impl ChartVersionResolver for HelmRegistries {
    fn latest_version<'a>(&'a self, chart: &'a str) -> BoxFuture<'a, String> {
        Box::pin(self.resolve(chart))
    }
}

/// `<base>/index.yaml`, keeping any path the repository lives under
pub fn index_url(base: &str) -> Result<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    Url::parse(&base)
        .and_then(|u| u.join(INDEX_FILE))
        .map_err(|e| ExporterError::RegistryError(format!("Invalid registry url {}: {}", base, e)))
}

/// Greatest version of `chart` listed in the index
pub fn latest_in_index(index: &RepoIndex, chart: &str, allow_prerelease: bool) -> Option<String> {
    index
        .entries
        .get(chart)?
        .iter()
        .filter_map(|entry| parse_version(&entry.version).map(|v| (v, &entry.version)))
        .filter(|(v, _)| allow_prerelease || v.pre.is_empty())
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw.clone())
}

/// ArtifactHub `repo/chart` paths to try for a chart
pub fn artifact_hub_paths(config: &RegistriesConfig, chart: &str) -> Vec<String> {
    if let Some(path) = config.override_chart_names.get(chart) {
        return vec![path.clone()];
    }
    config
        .registry_names
        .iter()
        .map(|repo| format!("{}/{}", repo, chart))
        .collect()
}
