// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runs the controller tasks under one cancellation scope.

use std::future::Future;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Owns the long-running tasks of the controller.
///
/// The first task to stop, whether failing or not, cancels all others and
/// decides the outcome. A shutdown signal cancels cooperatively and yields a
/// clean outcome once every task has exited.
pub struct Supervisor {
    cancel: CancellationToken,
    tasks: JoinSet<(&'static str, anyhow::Result<()>)>,
}

impl Supervisor {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            tasks: JoinSet::new(),
        }
    }

    /// Token tasks must observe to stop cooperatively
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        debug!("Starting task {}", name);
        self.tasks
            .spawn(async move { (name, task.await) }.in_current_span());
    }

    pub async fn run<S>(mut self, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()>,
    {
        futures::pin_mut!(shutdown);

        let outcome = tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received, stopping all tasks...");
                Ok(())
            }
            Some(joined) = self.tasks.join_next() => match joined {
                Ok((name, Ok(()))) if self.cancel.is_cancelled() => {
                    debug!("Task {} stopped", name);
                    Ok(())
                }
                Ok((name, Ok(()))) => {
                    error!("Task {} exited unexpectedly", name);
                    Err(anyhow::anyhow!("task {name} exited unexpectedly"))
                }
                Ok((name, Err(e))) => {
                    error!("Task {} failed: {:#}", name, e);
                    Err(e.context(format!("task {name} failed")))
                }
                Err(e) => {
                    error!("Task panicked or was aborted: {}", e);
                    Err(e.into())
                }
            },
        };

        self.cancel.cancel();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((name, Ok(()))) => debug!("Task {} stopped", name),
                Ok((name, Err(e))) => warn!("Task {} failed during shutdown: {:#}", name, e),
                Err(e) => warn!("Task panicked during shutdown: {}", e),
            }
        }

        outcome
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
