// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace listing utilities

use crate::error::{ReplicationError, Result};
use crate::sync::eligibility::is_eligible_namespace;
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::collections::BTreeSet;
use tracing::instrument;

/// List every namespace that should receive replicas
#[instrument(skip(client))]
pub async fn get_eligible_namespaces(
    client: &Client,
    source_namespace: &str,
) -> Result<BTreeSet<String>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let namespace_list = namespaces
        .list(&ListParams::default())
        .await
        .map_err(|source| ReplicationError::ListingError {
            kind: "namespaces",
            source,
        })?;

    Ok(namespace_list
        .items
        .iter()
        .map(ResourceExt::name_any)
        .filter(|name| is_eligible_namespace(name, source_namespace))
        .collect())
}
