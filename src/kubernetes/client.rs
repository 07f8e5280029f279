// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Creation of per-namespace release clients

use crate::error::Result;
use crate::helm::storage::{ClientHandle, KubeReleaseStore, StorageDriver};
use futures::future::BoxFuture;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Factory producing a release-listing handle for a namespace
pub trait ReleaseClientFactory: Send + Sync {
    fn connect<'a>(&'a self, namespace: &'a str) -> BoxFuture<'a, Result<ClientHandle>>;
}

/// Connects namespaces to the Helm storage of the cluster the exporter runs against
pub struct KubeClientFactory {
    client: Client,
    driver: String,
}

impl KubeClientFactory {
    pub fn new(client: Client, driver: &str) -> Self {
        Self {
            client,
            driver: driver.to_string(),
        }
    }

    #[instrument(skip(self), fields(driver = %self.driver))]
    async fn create_client(&self, namespace: &str) -> Result<ClientHandle> {
        let driver: StorageDriver = self.driver.parse()?;
        debug!("Creating {:?} release client", driver);
        let store = KubeReleaseStore::new(self.client.clone(), namespace, driver);
        Ok(Arc::new(store))
    }
}

impl ReleaseClientFactory for KubeClientFactory {
    fn connect<'a>(&'a self, namespace: &'a str) -> BoxFuture<'a, Result<ClientHandle>> {
        Box::pin(self.create_client(namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExporterError;
    use crate::test_utils::MockService;

    #[tokio::test]
    async fn test_connect_with_known_driver() {
        let factory = KubeClientFactory::new(MockService::new().into_client(), "configmap");
        assert!(factory.connect("apps").await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_with_unknown_driver_fails() {
        let factory = KubeClientFactory::new(MockService::new().into_client(), "memory");
        let result = factory.connect("apps").await;
        assert!(matches!(result, Err(ExporterError::UnsupportedDriver(_))));
    }
}
