// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Predicates deciding what gets replicated where.

use crate::constants::{annotations, parse_bool};
use k8s_openapi::api::core::v1::Secret;

/// Every namespace except the source namespace is a replication target
pub fn is_eligible_namespace(name: &str, source_namespace: &str) -> bool {
    name != source_namespace
}

/// Check if a source secret has the enabled annotation set to a true value
pub fn is_secret_enabled(secret: &Secret) -> bool {
    annotation_is_true(secret, annotations::ENABLED)
}

/// Check if a secret carries the replicated marker, i.e. is ours to manage
pub fn is_managed_replica(secret: &Secret) -> bool {
    annotation_is_true(secret, annotations::REPLICATED)
}

fn annotation_is_true(secret: &Secret, key: &str) -> bool {
    secret
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(key))
        .and_then(|v| parse_bool(v))
        .unwrap_or(false)
}
