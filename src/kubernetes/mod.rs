// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for namespace watching and release client creation.

pub mod client;
pub mod namespaces;

pub use client::{KubeClientFactory, ReleaseClientFactory};
pub use namespaces::{namespace_events, NamespaceEvent, NamespaceTracker};
