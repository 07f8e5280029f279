// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Unsupported Helm storage driver: {0}")]
    UnsupportedDriver(String),

    #[error("Failed to decode release {name}: {reason}")]
    ReleaseDecode { name: String, reason: String },

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Chart registry error: {0}")]
    RegistryError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid duration `{0}`")]
    InvalidInterval(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
