// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Central coordinator for replicating secrets into namespaces.
//!
//! The [`SyncManager`] exclusively owns the [`ReplicationState`]. Watchers and
//! the periodic scanner only send [`SyncEvent`]s; events are handled one at a
//! time, so a registry mutation and the replica operations it implies are
//! never interleaved with another pass.

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::error::{ReplicationError, Result};
use crate::sync::secrets::{ReplicaApplier, ReplicaOutcome};
use crate::sync::state::ReplicationState;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Events that watchers and the scanner send to the SyncManager
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A source secret was created or updated and is enabled
    SecretEnabled { secret: Secret },
    /// A source secret was deleted or is no longer enabled
    SecretDisabled { name: String },
    /// An eligible namespace appeared
    NamespaceAdded { name: String },
    /// A namespace was deleted; its replicas go with it
    NamespaceRemoved { name: String },
    /// A namespace exists but must no longer hold replicas
    NamespaceIneligible { name: String },
    /// A full listing is about to be taken
    ResyncStarted,
    /// A complete listing of eligible namespaces and enabled secrets
    Resync {
        namespaces: BTreeSet<String>,
        secrets: BTreeMap<String, Secret>,
    },
}

/// Handle to send events to the SyncManager
#[derive(Clone, Debug)]
pub struct SyncManagerHandle {
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncManagerHandle {
    pub async fn send(&self, event: SyncEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|e| ReplicationError::ChannelClosed(e.to_string()))
    }
}

/// Outcome counters for one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub foreign: usize,
    pub failed: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: ReplicaOutcome) {
        match outcome {
            ReplicaOutcome::Created => self.created += 1,
            ReplicaOutcome::Updated => self.updated += 1,
            ReplicaOutcome::Unchanged => self.unchanged += 1,
            ReplicaOutcome::Removed => self.removed += 1,
            ReplicaOutcome::Absent => {}
            ReplicaOutcome::Foreign => self.foreign += 1,
            ReplicaOutcome::Failed => self.failed += 1,
        }
    }
}

pub struct SyncManager {
    applier: ReplicaApplier,
    state: ReplicationState,
    event_rx: mpsc::Receiver<SyncEvent>,
}

impl SyncManager {
    pub fn new(applier: ReplicaApplier) -> (Self, SyncManagerHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let manager = Self {
            applier,
            state: ReplicationState::new(),
            event_rx,
        };

        let handle = SyncManagerHandle { event_tx };
        (manager, handle)
    }

    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!("SyncManager started, listening for events...");

        loop {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = self.event_rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = self.handle_event(event) => {}
            }
        }

        info!("SyncManager stopped");
        Ok(())
    }

    async fn handle_event(&mut self, event: SyncEvent) -> PassSummary {
        debug!("Handling event: {:?}", event);

        match event {
            SyncEvent::SecretEnabled { secret } => self.handle_secret_enabled(secret).await,
            SyncEvent::SecretDisabled { name } => self.handle_secret_disabled(&name).await,
            SyncEvent::NamespaceAdded { name } => self.handle_namespace_added(&name).await,
            SyncEvent::NamespaceRemoved { name } => {
                if self.state.forget_namespace(&name).is_some() {
                    info!("Namespace '{}' removed", name);
                }
                PassSummary::default()
            }
            SyncEvent::NamespaceIneligible { name } => {
                self.handle_namespace_ineligible(&name).await
            }
            SyncEvent::ResyncStarted => {
                self.state.begin_resync();
                PassSummary::default()
            }
            SyncEvent::Resync {
                namespaces,
                secrets,
            } => self.handle_resync(namespaces, secrets).await,
        }
    }

    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    async fn handle_secret_enabled(&mut self, secret: Secret) -> PassSummary {
        info!("Secret enabled, replicating to all known namespaces");
        let namespaces = self.state.record_secret(secret.clone());

        let mut summary = PassSummary::default();
        for namespace in &namespaces {
            summary.record(self.applier.apply(&secret, namespace).await);
        }
        summary
    }

    #[instrument(skip(self))]
    async fn handle_secret_disabled(&mut self, name: &str) -> PassSummary {
        let mut summary = PassSummary::default();
        let Some(namespaces) = self.state.forget_secret(name) else {
            debug!("Secret was not replicated, nothing to remove");
            return summary;
        };

        info!("Secret disabled, removing replicas from all known namespaces");
        for namespace in &namespaces {
            summary.record(self.applier.remove(name, namespace).await);
        }
        summary
    }

    #[instrument(skip(self))]
    async fn handle_namespace_added(&mut self, name: &str) -> PassSummary {
        let secrets = self.state.record_namespace(name);
        info!("Namespace added, replicating {} secrets", secrets.len());

        let mut summary = PassSummary::default();
        for secret in &secrets {
            summary.record(self.applier.apply(secret, name).await);
        }
        summary
    }

    #[instrument(skip(self))]
    async fn handle_namespace_ineligible(&mut self, name: &str) -> PassSummary {
        let mut summary = PassSummary::default();
        let Some(secret_names) = self.state.forget_namespace(name) else {
            debug!("Namespace was not a replication target");
            return summary;
        };

        info!("Namespace no longer eligible, removing {} replicas", secret_names.len());
        for secret_name in &secret_names {
            summary.record(self.applier.remove(secret_name, name).await);
        }
        summary
    }

    #[instrument(skip_all, fields(namespaces = namespaces.len(), secrets = secrets.len()))]
    async fn handle_resync(
        &mut self,
        namespaces: BTreeSet<String>,
        secrets: BTreeMap<String, Secret>,
    ) -> PassSummary {
        let plan = self.state.replace(namespaces, secrets);
        let mut summary = PassSummary::default();

        for secret_name in &plan.vanished_secrets {
            info!("Secret '{}' vanished from the source namespace", secret_name);
            for namespace in &plan.namespaces {
                summary.record(self.applier.remove(secret_name, namespace).await);
            }
        }

        for secret in &plan.secrets {
            for namespace in &plan.namespaces {
                summary.record(self.applier.apply(secret, namespace).await);
            }
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            removed = summary.removed,
            foreign = summary.foreign,
            failed = summary.failed,
            "Resync complete"
        );
        summary
    }
}
