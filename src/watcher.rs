// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keeps the client registry in line with the namespaces of the cluster.

use crate::kubernetes::{NamespaceEvent, ReleaseClientFactory};
use crate::registry::ClientRegistry;
use futures::{Stream, StreamExt};
use regex::Regex;
use std::pin::pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub struct NamespaceWatcher {
    registry: ClientRegistry,
    factory: Arc<dyn ReleaseClientFactory>,
    ignore: Vec<Regex>,
}

impl NamespaceWatcher {
    pub fn new(
        registry: ClientRegistry,
        factory: Arc<dyn ReleaseClientFactory>,
        ignore: Vec<Regex>,
    ) -> Self {
        Self {
            registry,
            factory,
            ignore,
        }
    }

    /// First ignore pattern with a non-empty match in `namespace`, if any.
    ///
    /// Only the leftmost match is considered and it must be non-empty, so `a*`
    /// ignores names starting with `a` and nothing else.
    pub fn ignored_by(&self, namespace: &str) -> Option<&Regex> {
        self.ignore
            .iter()
            .find(|re| re.find(namespace).is_some_and(|m| !m.as_str().is_empty()))
    }

    /// Connect a fixed list of namespaces once. Ignore patterns do not apply.
    pub async fn connect_all(&self, namespaces: &[String]) {
        for namespace in namespaces {
            self.connect(namespace).await;
        }
    }

    /// Apply namespace events until the stream ends or `cancel` fires
    pub async fn watch<S>(&self, events: S, cancel: CancellationToken)
    where
        S: Stream<Item = NamespaceEvent>,
    {
        let mut events = pin!(events);
        info!("Watching namespaces");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.next() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }

        debug!("Namespace watch stopped");
    }

    pub async fn handle(&self, event: NamespaceEvent) {
        match event {
            NamespaceEvent::Appeared(namespace) => {
                if let Some(pattern) = self.ignored_by(&namespace) {
                    info!("Namespace {} is in ignore list ({})", namespace, pattern);
                    return;
                }
                self.connect(&namespace).await;
            }
            NamespaceEvent::Removed(namespace) => {
                self.registry.remove(&namespace);
                info!("Removed namespace {} ({} registered)", namespace, self.registry.len());
            }
        }
    }

    #[instrument(skip(self))]
    async fn connect(&self, namespace: &str) {
        match self.factory.connect(namespace).await {
            Ok(handle) => {
                self.registry.add(namespace, handle);
                info!("Watching namespace {} ({} registered)", namespace, self.registry.len());
            }
            Err(e) => warn!("Failed to connect to {} with {}", namespace, e),
        }
    }
}
