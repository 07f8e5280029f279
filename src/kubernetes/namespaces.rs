// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace lifecycle events from the cluster

use futures::{future, stream, Stream, StreamExt};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    runtime::{watcher, WatchStreamExt},
    Api, Client, ResourceExt,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A namespace appearing in or disappearing from the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceEvent {
    Appeared(String),
    Removed(String),
}

/// Turns raw watch events into appear/remove transitions.
///
/// Updates to namespaces that are already known are swallowed. After a
/// re-list, namespaces missing from the fresh listing are reported removed.
#[derive(Debug, Default)]
pub struct NamespaceTracker {
    known: HashSet<String>,
    relisting: Option<HashSet<String>>,
}

impl NamespaceTracker {
    pub fn observe(&mut self, event: watcher::Event<Namespace>) -> Vec<NamespaceEvent> {
        match event {
            watcher::Event::Init => {
                self.relisting = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(ns) => {
                let name = ns.name_any();
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(name.clone());
                }
                self.appeared(name)
            }
            watcher::Event::InitDone => {
                let Some(seen) = self.relisting.take() else {
                    return Vec::new();
                };
                let mut gone: Vec<String> = self.known.difference(&seen).cloned().collect();
                gone.sort();
                for name in &gone {
                    self.known.remove(name);
                }
                gone.into_iter().map(NamespaceEvent::Removed).collect()
            }
            watcher::Event::Apply(ns) => self.appeared(ns.name_any()),
            watcher::Event::Delete(ns) => {
                let name = ns.name_any();
                self.known.remove(&name);
                vec![NamespaceEvent::Removed(name)]
            }
        }
    }

    fn appeared(&mut self, name: String) -> Vec<NamespaceEvent> {
        if self.known.insert(name.clone()) {
            vec![NamespaceEvent::Appeared(name)]
        } else {
            Vec::new()
        }
    }
}

/// Watch all namespaces in the cluster.
///
/// Watch failures are logged and the underlying watcher reconnects with
/// backoff; the stream itself never ends.
pub fn namespace_events(client: Client) -> impl Stream<Item = NamespaceEvent> + Send {
    let namespaces: Api<Namespace> = Api::all(client);
    let mut tracker = NamespaceTracker::default();

    watcher(namespaces, watcher::Config::default())
        .default_backoff()
        .filter_map(|res| {
            future::ready(match res {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Namespace watch error: {}", e);
                    None
                }
            })
        })
        .flat_map(move |event| {
            let transitions = tracker.observe(event);
            if !transitions.is_empty() {
                debug!("Namespace transitions: {:?}", transitions);
            }
            stream::iter(transitions)
        })
}
