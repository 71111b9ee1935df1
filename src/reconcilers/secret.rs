// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciler - watches source secrets and notifies sync manager.

use crate::config::Config;
use crate::kubernetes::{ChangeEvent, ResourceWatcher};
use crate::sync::eligibility::is_secret_enabled;
use crate::sync::{SyncEvent, SyncManagerHandle};
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct SecretReconciler {
    client: Client,
    source_namespace: String,
    sync_handle: SyncManagerHandle,
}

impl SecretReconciler {
    pub fn new(client: Client, config: &Config, sync_handle: SyncManagerHandle) -> Self {
        Self {
            client,
            source_namespace: config.source_namespace.clone(),
            sync_handle,
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.source_namespace);
        let events = ResourceWatcher::new(secrets, "secrets").events();

        super::forward("secrets", events, &self.sync_handle, &cancel, secret_sync_event).await?;

        info!("Secret watch stopped");
        Ok(())
    }
}

/// Translate a source secret change into the sync event it implies
pub fn secret_sync_event(change: ChangeEvent<Secret>) -> Option<SyncEvent> {
    match change {
        ChangeEvent::Added(secret) | ChangeEvent::Modified(secret) => {
            if is_secret_enabled(&secret) {
                debug!("Secret '{}' is enabled", secret.name_any());
                Some(SyncEvent::SecretEnabled { secret })
            } else {
                debug!("Secret '{}' is not enabled", secret.name_any());
                Some(SyncEvent::SecretDisabled {
                    name: secret.name_any(),
                })
            }
        }
        ChangeEvent::Deleted(secret) => {
            info!("Secret '{}' deleted", secret.name_any());
            Some(SyncEvent::SecretDisabled {
                name: secret.name_any(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::annotations;
    use crate::test_utils::secret;

    #[test]
    fn test_enabled_secret_is_replicated() {
        let change = ChangeEvent::Added(secret("prod", "db-cred", &[(annotations::ENABLED, "true")]));
        assert!(matches!(
            secret_sync_event(change),
            Some(SyncEvent::SecretEnabled { secret }) if secret.name_any() == "db-cred"
        ));
    }

    #[test]
    fn test_disabled_secret_is_withdrawn() {
        let change = ChangeEvent::Modified(secret("prod", "db-cred", &[(annotations::ENABLED, "false")]));
        assert!(matches!(
            secret_sync_event(change),
            Some(SyncEvent::SecretDisabled { name }) if name == "db-cred"
        ));
    }

    #[test]
    fn test_deleted_secret_is_withdrawn() {
        let change = ChangeEvent::Deleted(secret("prod", "db-cred", &[(annotations::ENABLED, "true")]));
        assert!(matches!(
            secret_sync_event(change),
            Some(SyncEvent::SecretDisabled { name }) if name == "db-cred"
        ));
    }
}
