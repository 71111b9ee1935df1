// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument, Span};

use auto_secret_replication::config::Config;
use auto_secret_replication::reconcilers::{NamespaceReconciler, SecretReconciler};
use auto_secret_replication::supervisor::{shutdown_signal, Supervisor};
use auto_secret_replication::sync::{PeriodicScanner, ReplicaApplier, SyncManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => {
            info!("Exited");
            Ok(())
        }
        Err(e) => {
            error!("Exited with error: {:#}", e);
            Err(e)
        }
    }
}

async fn run() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Tag every line while nothing is actually written
    let span = if config.dry_run {
        info_span!("dry_run")
    } else {
        Span::none()
    };

    async move {
        info!(
            "Starting auto secret replication: source_namespace={}, resync_interval={:?}",
            config.source_namespace, config.resync_interval
        );

        // Create Kubernetes client
        let client = Client::try_default().await?;
        info!("Connected to Kubernetes cluster");

        // Create the sync manager and get a handle for the feeds
        let applier = ReplicaApplier::new(client.clone(), config.dry_run);
        let (sync_manager, sync_handle) = SyncManager::new(applier);

        let namespace_reconciler =
            NamespaceReconciler::new(client.clone(), &config, sync_handle.clone());
        let secret_reconciler = SecretReconciler::new(client.clone(), &config, sync_handle.clone());
        let scanner = PeriodicScanner::new(client, &config, sync_handle);

        let mut supervisor = Supervisor::new(CancellationToken::new());
        let cancel = supervisor.cancellation();
        supervisor.spawn("sync-manager", sync_manager.run(cancel.clone()));
        supervisor.spawn("namespace-watch", namespace_reconciler.run(cancel.clone()));
        supervisor.spawn("secret-watch", secret_reconciler.run(cancel.clone()));
        supervisor.spawn("periodic-resync", scanner.run(cancel));

        supervisor.run(shutdown_signal()).await
    }
    .instrument(span)
    .await
}
