// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace reconciler - watches namespaces and notifies sync manager.

use crate::config::Config;
use crate::kubernetes::{ChangeEvent, ResourceWatcher};
use crate::sync::eligibility::is_eligible_namespace;
use crate::sync::{SyncEvent, SyncManagerHandle};
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct NamespaceReconciler {
    client: Client,
    source_namespace: String,
    sync_handle: SyncManagerHandle,
}

impl NamespaceReconciler {
    pub fn new(client: Client, config: &Config, sync_handle: SyncManagerHandle) -> Self {
        Self {
            client,
            source_namespace: config.source_namespace.clone(),
            sync_handle,
        }
    }

    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let events = ResourceWatcher::new(namespaces, "namespaces").events();
        let source_namespace = self.source_namespace.as_str();

        super::forward("namespaces", events, &self.sync_handle, &cancel, |change| {
            namespace_sync_event(change, source_namespace)
        })
        .await?;

        info!("Namespace watch stopped");
        Ok(())
    }
}

/// Translate a namespace change into the sync event it implies, if any
pub fn namespace_sync_event(
    change: ChangeEvent<Namespace>,
    source_namespace: &str,
) -> Option<SyncEvent> {
    match change {
        ChangeEvent::Added(ns) => {
            let name = ns.name_any();
            if is_eligible_namespace(&name, source_namespace) {
                info!("Namespace '{}' added", name);
                Some(SyncEvent::NamespaceAdded { name })
            } else {
                debug!("Namespace '{}' is the source namespace", name);
                Some(SyncEvent::NamespaceIneligible { name })
            }
        }
        // Eligibility only depends on the name, which cannot change
        ChangeEvent::Modified(_) => None,
        ChangeEvent::Deleted(ns) => {
            let name = ns.name_any();
            info!("Namespace '{}' deleted", name);
            Some(SyncEvent::NamespaceRemoved { name })
        }
    }
}
