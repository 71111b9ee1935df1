// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch-driven feeds that turn change events into sync events.

pub mod namespace;
pub mod secret;

pub use namespace::NamespaceReconciler;
pub use secret::SecretReconciler;

use crate::error::Result;
use crate::kubernetes::ChangeEvent;
use crate::sync::{SyncEvent, SyncManagerHandle};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

/// Forward translated change events to the sync manager until cancelled.
/// A subscription failure ends the feed with that error.
async fn forward<K, S, F>(
    kind: &'static str,
    events: S,
    sync_handle: &SyncManagerHandle,
    cancel: &CancellationToken,
    translate: F,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<ChangeEvent<K>>>,
    F: Fn(ChangeEvent<K>) -> Option<SyncEvent>,
{
    futures::pin_mut!(events);

    loop {
        let change = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            next = events.next() => match next {
                Some(change) => change?,
                None => anyhow::bail!("{kind} watch ended unexpectedly"),
            },
        };

        let Some(event) = translate(change) else {
            continue;
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            sent = sync_handle.send(event) => sent?,
        }
    }
}
