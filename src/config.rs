// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Exporter settings from flags/environment and the registry override file

use crate::error::{ExporterError, Result};
use crate::metrics::MetricToggles;
use clap::{ArgAction, Parser};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Command line settings, each also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "helm-exporter", about = "Prometheus exporter for Helm releases")]
pub struct Settings {
    /// Namespaces to monitor. Defaults to all
    #[arg(long, env = "NAMESPACES", default_value = "")]
    pub namespaces: String,

    /// Namespaces to ignore (comma separated regular expressions). Defaults to none
    #[arg(long, env = "NAMESPACES_IGNORE", default_value = "")]
    pub namespaces_ignore: String,

    /// Config file to load for helm overwrite registries. Default is empty
    #[arg(long, env = "CONFIG", default_value = "")]
    pub config: String,

    /// Gather metrics in the background at this interval; 0 computes them on every scrape
    #[arg(long, env = "INTERVAL_DURATION", default_value = "0")]
    pub interval_duration: String,

    /// Generate info metric
    #[arg(
        long,
        env = "INFO_METRIC",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
    )]
    pub info_metric: bool,

    /// Generate timestamps metric
    #[arg(
        long,
        env = "TIMESTAMP_METRIC",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
    )]
    pub timestamp_metric: bool,

    /// Generate version outdated metric
    #[arg(
        long,
        env = "OUTDATED_METRIC",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
    )]
    pub outdated_metric: bool,

    /// Attempt to fetch the latest chart version from registries
    #[arg(
        long,
        env = "LATEST_CHART_VERSION",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
    )]
    pub latest_chart_version: bool,

    /// Enables debug logging
    #[arg(
        long,
        env = "VERBOSE",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
    )]
    pub verbose: bool,

    /// Helm storage driver (secret or configmap)
    #[arg(long, env = "HELM_DRIVER", default_value = "secret")]
    pub helm_driver: String,
}

impl Settings {
    pub fn toggles(&self) -> MetricToggles {
        MetricToggles {
            info: self.info_metric,
            timestamp: self.timestamp_metric,
            outdated: self.outdated_metric,
        }
    }

    pub fn interval(&self) -> Result<Duration> {
        parse_interval(&self.interval_duration)
    }

    pub fn ignore_patterns(&self) -> Vec<Regex> {
        compile_ignore_patterns(&self.namespaces_ignore)
    }

    /// The fixed namespace list, or `None` when namespaces should be watched
    pub fn static_namespaces(&self) -> Option<Vec<String>> {
        if self.namespaces.trim().is_empty() {
            return None;
        }
        Some(
            self.namespaces
                .split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Compile a comma separated list of patterns, dropping the ones that fail
pub fn compile_ignore_patterns(list: &str) -> Vec<Regex> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Ignoring invalid namespace pattern `{}`: {}", p, e);
                None
            }
        })
        .collect()
}

/// Parse a duration such as `30s`, `1h30m`, `1.5h` or `250ms`. A bare `0` is allowed.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let invalid = || ExporterError::InvalidInterval(input.to_string());

    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut rest = s;
    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if !number.chars().any(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1f64,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };

        total_nanos += value * scale;
        rest = tail;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Contents of the optional configuration file
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default)]
    pub helm_registries: RegistriesConfig,
}

/// Where to look up the latest version of a chart
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistriesConfig {
    /// Chart name to ArtifactHub `repo/chart` path
    #[serde(default)]
    pub override_chart_names: HashMap<String, String>,
    /// Helm repositories consulted for specific charts
    #[serde(default, rename = "override")]
    pub overrides: Vec<RegistryOverride>,
    /// ArtifactHub repositories searched for any chart
    #[serde(default)]
    pub registry_names: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistryOverride {
    pub registry: RegistryLocation,
    #[serde(default)]
    pub charts: Vec<String>,
    /// Also consider pre-release versions
    #[serde(default)]
    pub allow_all_releases: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegistryLocation {
    pub url: String,
}

impl FileConfig {
    /// Load the file at `path`; an empty path yields the defaults
    pub fn load(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(Path::new(path))
            .map_err(|e| ExporterError::ConfigError(format!("Failed to read {}: {}", path, e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ExporterError::ConfigError(format!("Failed to parse {}: {}", path, e)))
    }
}
