// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Replication state, reconciliation and replica operations.

pub mod eligibility;
pub mod manager;
pub mod scanner;
pub mod secrets;
pub mod state;

pub use manager::{SyncEvent, SyncManager, SyncManagerHandle};
pub use scanner::PeriodicScanner;
pub use secrets::{ReplicaApplier, ReplicaOutcome};
