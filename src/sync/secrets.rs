// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Source secret listing and replica create/update/delete.

use crate::constants::annotations;
use crate::error::{ReplicationError, Result};
use crate::sync::eligibility::{is_managed_replica, is_secret_enabled};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, ListParams, ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one replica in one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaOutcome {
    Created,
    Updated,
    /// The managed replica already matched its source
    Unchanged,
    Removed,
    /// Nothing to remove
    Absent,
    /// A same-named object without the replicated marker was left alone
    Foreign,
    /// An API call failed; the next event or resync retries
    Failed,
}

/// List the enabled secrets of the source namespace, keyed by name
#[instrument(skip(client))]
pub async fn get_enabled_secrets(
    client: &Client,
    source_namespace: &str,
) -> Result<BTreeMap<String, Secret>> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), source_namespace);
    let secret_list = secrets
        .list(&ListParams::default())
        .await
        .map_err(|source| ReplicationError::ListingError {
            kind: "secrets",
            source,
        })?;

    Ok(secret_list
        .items
        .into_iter()
        .filter(is_secret_enabled)
        .map(|s| (s.name_any(), s))
        .collect())
}

/// Build the replica of a source secret for a target namespace.
///
/// Only user-owned fields are carried over; server-populated metadata such as
/// uid, resourceVersion or ownerReferences belongs to the source object.
pub fn build_replica(secret: &Secret, target_namespace: &str) -> Secret {
    let mut replica_annotations = secret.metadata.annotations.clone().unwrap_or_default();
    replica_annotations.remove(annotations::ENABLED);
    replica_annotations.insert(annotations::REPLICATED.to_string(), "true".to_string());

    Secret {
        metadata: ObjectMeta {
            name: secret.metadata.name.clone(),
            namespace: Some(target_namespace.to_string()),
            labels: secret.metadata.labels.clone(),
            annotations: Some(replica_annotations),
            ..Default::default()
        },
        data: secret.data.clone(),
        string_data: secret.string_data.clone(),
        type_: secret.type_.clone(),
        immutable: secret.immutable,
    }
}

fn matches_replica(existing: &Secret, candidate: &Secret) -> bool {
    existing.data == candidate.data
        && existing.type_ == candidate.type_
        && existing.immutable == candidate.immutable
        && existing.metadata.labels == candidate.metadata.labels
        && existing.metadata.annotations == candidate.metadata.annotations
}

/// Creates, updates and removes replicas in target namespaces, refusing to
/// touch any object that lacks the replicated marker.
#[derive(Clone)]
pub struct ReplicaApplier {
    client: Client,
    dry_run: bool,
}

impl ReplicaApplier {
    pub fn new(client: Client, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Create or update the replica of `secret` in `target_namespace`
    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    pub async fn apply(&self, secret: &Secret, target_namespace: &str) -> ReplicaOutcome {
        let secret_name = secret.name_any();
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), target_namespace);
        let mut candidate = build_replica(secret, target_namespace);

        let existing = match secrets.get(&secret_name).await {
            Ok(existing) => existing,
            Err(kube::Error::Api(err)) if err.code == 404 => {
                if self.dry_run {
                    info!("Would create secret {} in {}", secret_name, target_namespace);
                    return ReplicaOutcome::Created;
                }
                return match secrets.create(&PostParams::default(), &candidate).await {
                    Ok(_) => {
                        info!("Replicated secret {} in {}", secret_name, target_namespace);
                        ReplicaOutcome::Created
                    }
                    Err(e) => {
                        error!(
                            "Failed to replicate secret {} in {}: {}",
                            secret_name, target_namespace, e
                        );
                        ReplicaOutcome::Failed
                    }
                };
            }
            Err(e) => {
                error!(
                    "Failed to check if secret {} exists in {}: {}",
                    secret_name, target_namespace, e
                );
                return ReplicaOutcome::Failed;
            }
        };

        if !is_managed_replica(&existing) {
            warn!(
                "Secret {} exists in {} and is not a replicated secret, leaving it alone",
                secret_name, target_namespace
            );
            return ReplicaOutcome::Foreign;
        }

        if matches_replica(&existing, &candidate) {
            debug!("Secret {} in {} is up to date", secret_name, target_namespace);
            return ReplicaOutcome::Unchanged;
        }

        if self.dry_run {
            info!("Would update secret {} in {}", secret_name, target_namespace);
            return ReplicaOutcome::Updated;
        }

        candidate.metadata.resource_version = existing.metadata.resource_version;
        match secrets
            .replace(&secret_name, &PostParams::default(), &candidate)
            .await
        {
            Ok(_) => {
                info!("Updated secret {} in {}", secret_name, target_namespace);
                ReplicaOutcome::Updated
            }
            Err(e) => {
                error!(
                    "Failed to update secret {} in {}: {}",
                    secret_name, target_namespace, e
                );
                ReplicaOutcome::Failed
            }
        }
    }

    /// Delete the replica named `secret_name` from `target_namespace`, if it is ours
    #[instrument(skip(self))]
    pub async fn remove(&self, secret_name: &str, target_namespace: &str) -> ReplicaOutcome {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), target_namespace);

        let existing = match secrets.get(secret_name).await {
            Ok(existing) => existing,
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("Secret {} does not exist in {}", secret_name, target_namespace);
                return ReplicaOutcome::Absent;
            }
            Err(e) => {
                error!(
                    "Failed to check if secret {} exists in {}: {}",
                    secret_name, target_namespace, e
                );
                return ReplicaOutcome::Failed;
            }
        };

        if !is_managed_replica(&existing) {
            warn!(
                "Secret {} exists in {} and is not a replicated secret, leaving it alone",
                secret_name, target_namespace
            );
            return ReplicaOutcome::Foreign;
        }

        if self.dry_run {
            info!("Would remove secret {} from {}", secret_name, target_namespace);
            return ReplicaOutcome::Removed;
        }

        match secrets.delete(secret_name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("Removed secret {} from {}", secret_name, target_namespace);
                ReplicaOutcome::Removed
            }
            Err(kube::Error::Api(err)) if err.code == 404 => ReplicaOutcome::Absent,
            Err(e) => {
                error!(
                    "Failed to remove secret {} from {}: {}",
                    secret_name, target_namespace, e
                );
                ReplicaOutcome::Failed
            }
        }
    }
}
