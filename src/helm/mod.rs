// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helm release model and storage access.

pub mod release;
pub mod storage;

pub use release::{Release, ReleaseStatus};
pub use storage::{ClientHandle, KubeReleaseStore, ReleaseLister, StorageDriver};
