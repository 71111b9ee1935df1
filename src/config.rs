// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::constants::{env as keys, parse_bool, resync};

/// Controller configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace holding the canonical secrets
    pub source_namespace: String,
    /// Log intended mutations instead of performing them
    pub dry_run: bool,
    /// Interval between two full resyncs
    pub resync_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source_namespace = lookup(keys::SOURCE_NAMESPACE)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if source_namespace.is_empty() {
            bail!(
                "missing environment variable: {}",
                keys::SOURCE_NAMESPACE
            );
        }

        let dry_run = lookup(keys::DRY_RUN)
            .and_then(|v| parse_bool(v.trim()))
            .unwrap_or(false);

        let resync_interval = match lookup(keys::RESYNC_INTERVAL_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("{} must be a positive integer, got '{raw}'", keys::RESYNC_INTERVAL_SECS)
                })?;
                if secs == 0 {
                    bail!("{} must be greater than zero", keys::RESYNC_INTERVAL_SECS);
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(resync::DEFAULT_INTERVAL_SECS),
        };

        Ok(Config {
            source_namespace,
            dry_run,
            resync_interval,
        })
    }
}
