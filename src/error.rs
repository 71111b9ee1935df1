// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("Failed to subscribe to {kind}: {source}")]
    SubscribeError {
        kind: &'static str,
        #[source]
        source: kube::runtime::watcher::Error,
    },

    #[error("Failed to list {kind}: {source}")]
    ListingError {
        kind: &'static str,
        #[source]
        source: kube::Error,
    },

    #[error("Sync manager is gone: {0}")]
    ChannelClosed(String),
}

pub type Result<T> = std::result::Result<T, ReplicationError>;
