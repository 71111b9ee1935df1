// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory registry of eligible namespaces and enabled source secrets.
//!
//! Every mutation hands back exactly what the caller has to reconcile, so the
//! registry update and the replica operations derived from it stay atomic as
//! long as the caller owns the registry exclusively.

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct ReplicationState {
    namespaces: BTreeSet<String>,
    secrets: BTreeMap<String, Secret>,
    /// Names changed by watch events since the current listing was started
    touched_namespaces: BTreeSet<String>,
    touched_secrets: BTreeSet<String>,
}

/// Work derived from reconciling the registry with a fresh listing
#[derive(Debug, Default, PartialEq)]
pub struct ResyncPlan {
    /// Previously known secrets absent from the listing
    pub vanished_secrets: Vec<String>,
    /// Namespaces known after the resync
    pub namespaces: Vec<String>,
    /// Secrets known after the resync
    pub secrets: Vec<Secret>,
}

impl ReplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember an enabled secret; returns every known namespace
    pub fn record_secret(&mut self, secret: Secret) -> Vec<String> {
        let name = secret.name_any();
        self.touched_secrets.insert(name.clone());
        self.secrets.insert(name, secret);
        self.namespaces.iter().cloned().collect()
    }

    /// Drop a secret; returns every known namespace, or `None` if the secret was unknown
    pub fn forget_secret(&mut self, name: &str) -> Option<Vec<String>> {
        self.touched_secrets.insert(name.to_string());
        self.secrets.remove(name)?;
        Some(self.namespaces.iter().cloned().collect())
    }

    /// Remember an eligible namespace; returns every known secret
    pub fn record_namespace(&mut self, name: &str) -> Vec<Secret> {
        self.touched_namespaces.insert(name.to_string());
        self.namespaces.insert(name.to_string());
        self.secrets.values().cloned().collect()
    }

    /// Drop a namespace; returns the names of every known secret, or `None` if
    /// the namespace was unknown
    pub fn forget_namespace(&mut self, name: &str) -> Option<Vec<String>> {
        self.touched_namespaces.insert(name.to_string());
        if !self.namespaces.remove(name) {
            return None;
        }
        Some(self.secrets.keys().cloned().collect())
    }

    /// A listing is about to be taken; later watch changes take precedence over it
    pub fn begin_resync(&mut self) {
        self.touched_namespaces.clear();
        self.touched_secrets.clear();
    }

    /// Reconcile the registry with a complete listing.
    ///
    /// The listing is authoritative for every name no watch event changed
    /// since [`begin_resync`](Self::begin_resync) (or since the previous
    /// resync); for the others the registry already holds newer knowledge.
    pub fn replace(
        &mut self,
        namespaces: BTreeSet<String>,
        secrets: BTreeMap<String, Secret>,
    ) -> ResyncPlan {
        let vanished_secrets = self
            .secrets
            .keys()
            .filter(|name| !secrets.contains_key(*name) && !self.touched_secrets.contains(*name))
            .cloned()
            .collect();

        let touched_namespaces = std::mem::take(&mut self.touched_namespaces);
        let mut merged_namespaces: BTreeSet<String> = namespaces
            .into_iter()
            .filter(|name| !touched_namespaces.contains(name))
            .collect();
        merged_namespaces.extend(
            self.namespaces
                .intersection(&touched_namespaces)
                .cloned(),
        );

        let touched_secrets = std::mem::take(&mut self.touched_secrets);
        let mut merged_secrets: BTreeMap<String, Secret> = secrets
            .into_iter()
            .filter(|(name, _)| !touched_secrets.contains(name))
            .collect();
        for name in &touched_secrets {
            if let Some(secret) = self.secrets.get(name) {
                merged_secrets.insert(name.clone(), secret.clone());
            }
        }

        self.namespaces = merged_namespaces;
        self.secrets = merged_secrets;

        ResyncPlan {
            vanished_secrets,
            namespaces: self.namespaces.iter().cloned().collect(),
            secrets: self.secrets.values().cloned().collect(),
        }
    }

    #[cfg(test)]
    pub fn knows_namespace(&self, name: &str) -> bool {
        self.namespaces.contains(name)
    }

    #[cfg(test)]
    pub fn knows_secret(&self, name: &str) -> bool {
        self.secrets.contains_key(name)
    }
}
