// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus gauge families and their publication.

pub mod collection;
pub mod publisher;

pub use collection::{MetricCollection, MetricToggles};
pub use publisher::{MetricsPublisher, ScanMode};
