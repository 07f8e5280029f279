// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Published chart versions and staleness checks.

pub mod registry;
pub mod version;

use futures::future::BoxFuture;

pub use registry::HelmRegistries;
pub use version::{is_outdated, parse_version};

/// Looks up the newest published version of a chart.
///
/// An empty string means the version is unknown.
pub trait ChartVersionResolver: Send + Sync {
    fn latest_version<'a>(&'a self, chart: &'a str) -> BoxFuture<'a, String>;
}
