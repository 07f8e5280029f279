// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod charts;
pub mod config;
pub mod constants;
pub mod error;
pub mod helm;
pub mod kubernetes;
pub mod metrics;
pub mod registry;
pub mod scanner;
pub mod server;
pub mod watcher;

#[cfg(test)]
mod test_utils;
