// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Restartable list+watch subscription yielding typed change events.
//!
//! The underlying `kube` watcher re-lists after every interruption. A
//! [`ChangeTracker`] remembers what was seen before, so a re-list surfaces as
//! `Modified` for survivors and `Deleted` for objects that vanished meanwhile.

use crate::error::{ReplicationError, Result};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use kube::{Api, Resource, ResourceExt};
use kube_runtime::watcher::{self, Config as WatcherConfig, Event};
use kube_runtime::WatchStreamExt;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use tracing::{debug, info, warn};

/// A change to one watched object
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<K> {
    Added(K),
    Modified(K),
    Deleted(K),
}

/// Translates raw watcher events into [`ChangeEvent`]s
#[derive(Debug)]
pub struct ChangeTracker<K> {
    known: BTreeMap<String, K>,
    /// Objects known before the current re-list that it has not confirmed yet
    stale: Option<BTreeMap<String, K>>,
}

impl<K> Default for ChangeTracker<K> {
    fn default() -> Self {
        Self {
            known: BTreeMap::new(),
            stale: None,
        }
    }
}

impl<K: Resource + Clone> ChangeTracker<K> {
    pub fn observe(&mut self, event: Event<K>) -> Vec<ChangeEvent<K>> {
        match event {
            Event::Init => {
                let mut stale = self.stale.take().unwrap_or_default();
                stale.append(&mut self.known);
                self.stale = Some(stale);
                Vec::new()
            }
            Event::InitApply(obj) => {
                let name = obj.name_any();
                let seen_before = self
                    .stale
                    .as_mut()
                    .and_then(|stale| stale.remove(&name))
                    .is_some();
                self.known.insert(name, obj.clone());
                if seen_before {
                    vec![ChangeEvent::Modified(obj)]
                } else {
                    vec![ChangeEvent::Added(obj)]
                }
            }
            Event::InitDone => self
                .stale
                .take()
                .unwrap_or_default()
                .into_values()
                .map(ChangeEvent::Deleted)
                .collect(),
            Event::Apply(obj) => {
                let previous = self.known.insert(obj.name_any(), obj.clone());
                if previous.is_some() {
                    vec![ChangeEvent::Modified(obj)]
                } else {
                    vec![ChangeEvent::Added(obj)]
                }
            }
            Event::Delete(obj) => {
                self.known.remove(&obj.name_any());
                vec![ChangeEvent::Deleted(obj)]
            }
        }
    }
}

/// Subscription to one resource kind
pub struct ResourceWatcher<K> {
    api: Api<K>,
    kind: &'static str,
}

struct WatchState<K> {
    kind: &'static str,
    inner: BoxStream<'static, std::result::Result<Event<K>, watcher::Error>>,
    tracker: ChangeTracker<K>,
    pending: VecDeque<ChangeEvent<K>>,
    established: bool,
}

impl<K> ResourceWatcher<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
{
    pub fn new(api: Api<K>, kind: &'static str) -> Self {
        Self { api, kind }
    }

    /// Infinite stream of change events.
    ///
    /// Failing to complete the first listing yields a single
    /// [`ReplicationError::SubscribeError`] and ends the stream; interruptions
    /// after that are logged and the subscription is re-established.
    pub fn events(self) -> impl Stream<Item = Result<ChangeEvent<K>>> + Send {
        let state = WatchState {
            kind: self.kind,
            inner: watcher::watcher(self.api, WatcherConfig::default())
                .default_backoff()
                .boxed(),
            tracker: ChangeTracker::default(),
            pending: VecDeque::new(),
            established: false,
        };

        stream::unfold(Some(state), |state| async move {
            let mut state = state?;
            loop {
                if let Some(change) = state.pending.pop_front() {
                    return Some((Ok(change), Some(state)));
                }
                match state.inner.next().await? {
                    Ok(event) => {
                        if matches!(event, Event::InitDone) {
                            if state.established {
                                debug!("Re-listed {}", state.kind);
                            } else {
                                info!("Watching {}", state.kind);
                                state.established = true;
                            }
                        }
                        let changes = state.tracker.observe(event);
                        state.pending.extend(changes);
                    }
                    Err(source) if !state.established => {
                        let err = ReplicationError::SubscribeError {
                            kind: state.kind,
                            source,
                        };
                        return Some((Err(err), None));
                    }
                    Err(e) => {
                        warn!("Watch on {} interrupted, resubscribing: {}", state.kind, e);
                    }
                }
            }
        })
    }
}
