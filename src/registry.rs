// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace to release-client registry shared by the watcher and the scanner.

use crate::helm::storage::ClientHandle;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent map from namespace to the handle used to list its releases.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, ClientHandle>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the handle for `namespace`
    pub fn add(&self, namespace: &str, handle: ClientHandle) {
        self.clients.write().insert(namespace.to_string(), handle);
    }

    /// Unregister `namespace`, whether or not it was registered
    pub fn remove(&self, namespace: &str) {
        self.clients.write().remove(namespace);
    }

    /// Point-in-time copy of all registrations, ordered by namespace.
    ///
    /// The lock is released before returning so callers may await while
    /// iterating.
    pub fn snapshot(&self) -> Vec<(String, ClientHandle)> {
        let mut entries: Vec<_> = self
            .clients
            .read()
            .iter()
            .map(|(ns, handle)| (ns.clone(), Arc::clone(handle)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.clients.read().len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, namespace: &str) -> bool {
        self.clients.read().contains_key(namespace)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}
