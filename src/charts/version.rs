// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Chart version parsing and comparison

use semver::{BuildMetadata, Version};
use std::cmp::Ordering;

/// Parse a chart version, accepting a leading `v`, leading zeros and missing
/// minor/patch parts
pub fn parse_version(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);

    let parts: Vec<&str> = core.split('.').collect();
    let numeric = |p: &&str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if parts.len() > 3 || !parts.iter().all(numeric) {
        return None;
    }
    let mut numbers = parts
        .iter()
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    numbers.resize(3, 0);

    Version::parse(&format!("{}.{}.{}{}", numbers[0], numbers[1], numbers[2], suffix)).ok()
}

/// Whether `latest` is a newer release than `installed`.
///
/// Build metadata is ignored. A pre-release `latest` only counts when `installed`
/// is itself a pre-release. Anything that does not parse is never outdated.
pub fn is_outdated(installed: &str, latest: &str) -> bool {
    let (Some(mut installed), Some(mut latest)) = (parse_version(installed), parse_version(latest))
    else {
        return false;
    };
    if !latest.pre.is_empty() && installed.pre.is_empty() {
        return false;
    }
    installed.build = BuildMetadata::EMPTY;
    latest.build = BuildMetadata::EMPTY;
    latest.cmp(&installed) == Ordering::Greater
}
