// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Periodic full resync, independent of watch delivery.

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::get_eligible_namespaces;
use crate::sync::manager::{SyncEvent, SyncManagerHandle};
use crate::sync::secrets::get_enabled_secrets;
use kube::Client;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

pub struct PeriodicScanner {
    client: Client,
    source_namespace: String,
    interval: Duration,
    sync_handle: SyncManagerHandle,
}

impl PeriodicScanner {
    pub fn new(client: Client, config: &Config, sync_handle: SyncManagerHandle) -> Self {
        Self {
            client,
            source_namespace: config.source_namespace.clone(),
            interval: config.resync_interval,
            sync_handle,
        }
    }

    /// Scan immediately, then once per interval until cancelled.
    /// A failed listing ends the scanner with an error.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!("Periodic resync every {:?}", self.interval);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.scan_once() => result?,
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = sleep(self.interval) => {}
            }
        }

        info!("Periodic resync stopped");
        Ok(())
    }

    /// List everything and hand the result to the sync manager
    #[instrument(skip(self), fields(source = %self.source_namespace))]
    pub async fn scan_once(&self) -> Result<()> {
        self.sync_handle.send(SyncEvent::ResyncStarted).await?;
        let namespaces = get_eligible_namespaces(&self.client, &self.source_namespace).await?;
        let secrets = get_enabled_secrets(&self.client, &self.source_namespace).await?;

        info!(
            "Found {} eligible namespaces and {} enabled secrets",
            namespaces.len(),
            secrets.len()
        );

        self.sync_handle
            .send(SyncEvent::Resync {
                namespaces,
                secrets,
            })
            .await
    }
}
