// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for watching resources and listing namespaces.

pub mod namespaces;
pub mod watcher;

pub use namespaces::get_eligible_namespaces;
pub use watcher::{ChangeEvent, ResourceWatcher};
