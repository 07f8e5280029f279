// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reading Helm releases from the Kubernetes objects Helm stores them in.

use crate::constants::storage::{OWNER_SELECTOR, RELEASE_KEY};
use crate::error::{ExporterError, Result};
use crate::helm::release::{decode_release, Release, ReleaseStatus};
use futures::future::BoxFuture;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Namespace-scoped capability to list releases
pub trait ReleaseLister: Send + Sync {
    fn list_releases(&self) -> BoxFuture<'_, Result<Vec<Release>>>;
}

/// Shared handle stored in the client registry
pub type ClientHandle = Arc<dyn ReleaseLister>;

/// Kubernetes object kind Helm persists releases in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageDriver {
    Secrets,
    ConfigMaps,
}

impl FromStr for StorageDriver {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "secret" | "secrets" => Ok(StorageDriver::Secrets),
            "configmap" | "configmaps" => Ok(StorageDriver::ConfigMaps),
            other => Err(ExporterError::UnsupportedDriver(other.to_string())),
        }
    }
}

/// Release lister backed by the Helm storage objects of one namespace
pub struct KubeReleaseStore {
    client: Client,
    namespace: String,
    driver: StorageDriver,
}

impl KubeReleaseStore {
    pub fn new(client: Client, namespace: &str, driver: StorageDriver) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            driver,
        }
    }

    fn api<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        // An empty namespace lists across the whole cluster
        if self.namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), &self.namespace)
        }
    }

    #[instrument(skip(self), fields(namespace = %self.namespace, driver = ?self.driver))]
    async fn fetch(&self) -> Result<Vec<Release>> {
        let lp = ListParams::default().labels(OWNER_SELECTOR);

        let payloads: Vec<(String, Vec<u8>)> = match self.driver {
            StorageDriver::Secrets => {
                let secrets: Api<Secret> = self.api();
                secrets
                    .list(&lp)
                    .await?
                    .items
                    .into_iter()
                    .filter_map(|s| {
                        let name = s.name_any();
                        let payload = s.data?.remove(RELEASE_KEY)?;
                        Some((name, payload.0))
                    })
                    .collect()
            }
            StorageDriver::ConfigMaps => {
                let config_maps: Api<ConfigMap> = self.api();
                config_maps
                    .list(&lp)
                    .await?
                    .items
                    .into_iter()
                    .filter_map(|cm| {
                        let name = cm.name_any();
                        let payload = cm.data?.remove(RELEASE_KEY)?;
                        Some((name, payload.into_bytes()))
                    })
                    .collect()
            }
        };

        debug!("Found {} release objects", payloads.len());

        let releases = payloads
            .into_iter()
            .filter_map(|(name, payload)| match decode_release(&name, &payload) {
                Ok(release) => Some(release),
                Err(e) => {
                    warn!("Skipping release object {}: {}", name, e);
                    None
                }
            })
            .collect();

        Ok(latest_deployed_or_failed(releases))
    }
}

impl ReleaseLister for KubeReleaseStore {
    fn list_releases(&self) -> BoxFuture<'_, Result<Vec<Release>>> {
        Box::pin(self.fetch())
    }
}

/// Keep the newest revision of every release, then only the deployed or failed ones.
///
/// This is what `helm list` shows without any state flags.
pub fn latest_deployed_or_failed(releases: Vec<Release>) -> Vec<Release> {
    let mut latest: HashMap<(String, String), Release> = HashMap::new();

    for release in releases {
        let key = (release.namespace.clone(), release.name.clone());
        match latest.get(&key) {
            Some(current) if current.version >= release.version => {}
            _ => {
                latest.insert(key, release);
            }
        }
    }

    let mut listed: Vec<Release> = latest
        .into_values()
        .filter(|r| matches!(r.status(), ReleaseStatus::Deployed | ReleaseStatus::Failed))
        .collect();
    listed.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.namespace.cmp(&b.namespace)));
    listed
}
