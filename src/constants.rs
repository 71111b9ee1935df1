// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys forming the replication wire contract
pub mod annotations {
    /// When set to a true value on a secret in the source namespace, replicates it
    pub const ENABLED: &str = "net.guoyk.auto-secret-replication/enabled";
    /// Stamped on every replica; marks the object as owned by this controller
    pub const REPLICATED: &str = "net.guoyk.auto-secret-replication/replicated";
}

/// Environment variables read at startup
pub mod env {
    pub const SOURCE_NAMESPACE: &str = "SOURCE_NAMESPACE";
    pub const DRY_RUN: &str = "SECRET_AUTO_REPLICATION_DRY_RUN";
    pub const RESYNC_INTERVAL_SECS: &str = "RESYNC_INTERVAL_SECS";
}

/// Full resync configuration
pub mod resync {
    /// Default interval between two full listings (15 minutes)
    pub const DEFAULT_INTERVAL_SECS: u64 = 15 * 60;
}

/// Capacity of the channel feeding the sync manager
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Parse a boolean the way Go's `strconv.ParseBool` does, which is what
/// existing users of the annotation protocol write.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
