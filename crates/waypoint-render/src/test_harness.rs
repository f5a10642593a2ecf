//! Backend that records every call instead of talking to clients.
//!
//! Used by the engine tests and by the demo binary to observe exactly what
//! a viewer's client would have received.

use std::collections::HashSet;

use parking_lot::Mutex;
use waypoint_core::{ActorId, ProxyId};

use crate::backend::{EntityLink, Metadata, MetadataKey, MetadataValue, ProxySpawn, RenderBackend};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Spawn(ActorId, ProxySpawn),
    Despawn(ActorId, ProxyId),
    SetMetadata(ActorId, ProxyId, Metadata),
    SendLink(ActorId, EntityLink),
}

impl BackendCall {
    pub fn viewer(&self) -> ActorId {
        match self {
            BackendCall::Spawn(v, _)
            | BackendCall::Despawn(v, _)
            | BackendCall::SetMetadata(v, _, _)
            | BackendCall::SendLink(v, _) => *v,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Drain the call log.
    pub fn take(&self) -> Vec<BackendCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn spawn_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Spawn(..)))
    }

    pub fn despawn_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Despawn(..)))
    }

    pub fn metadata_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::SetMetadata(..)))
    }

    pub fn link_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::SendLink(..)))
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    /// Proxies currently visible to `viewer`: spawned and not despawned since.
    pub fn visible(&self, viewer: ActorId) -> HashSet<ProxyId> {
        let mut live = HashSet::new();
        for call in self.calls.lock().iter() {
            match call {
                BackendCall::Spawn(v, spawn) if *v == viewer => {
                    live.insert(spawn.proxy);
                }
                BackendCall::Despawn(v, proxy) if *v == viewer => {
                    live.remove(proxy);
                }
                _ => {}
            }
        }
        live
    }

    /// Most recent nametag pushed to `proxy`.
    pub fn last_label(&self, proxy: ProxyId) -> Option<String> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            BackendCall::SetMetadata(_, p, metadata) if *p == proxy => {
                metadata.iter().find_map(|(key, value)| match (key, value) {
                    (MetadataKey::Nametag, MetadataValue::String(s)) => Some(s.clone()),
                    _ => None,
                })
            }
            _ => None,
        })
    }
}

impl RenderBackend for RecordingBackend {
    fn spawn(&self, viewer: ActorId, spawn: ProxySpawn) {
        self.calls.lock().push(BackendCall::Spawn(viewer, spawn));
    }

    fn despawn(&self, viewer: ActorId, proxy: ProxyId) {
        self.calls.lock().push(BackendCall::Despawn(viewer, proxy));
    }

    fn set_metadata(&self, viewer: ActorId, proxy: ProxyId, metadata: Metadata) {
        self.calls
            .lock()
            .push(BackendCall::SetMetadata(viewer, proxy, metadata));
    }

    fn send_link(&self, viewer: ActorId, link: EntityLink) {
        self.calls.lock().push(BackendCall::SendLink(viewer, link));
    }
}
