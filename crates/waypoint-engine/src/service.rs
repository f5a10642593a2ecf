use std::sync::Arc;

use parking_lot::Mutex;
use waypoint_core::text::lookup_key;
use waypoint_core::{
    ActorId, ActorSnapshot, ExternalError, LimitEvaluator, Waypoint, WaypointConfig,
};
use waypoint_render::{ProxyIdAllocator, RenderBackend, UpdaterState};

use crate::error::CommandError;
use crate::host::{ActorDirectory, PreferencePrompt};
use crate::listener::WaypointListener;
use crate::locks::{OperationGuard, OperationLocks};
use crate::reconcile::SelectionDelta;
use crate::registry::{RenderContext, RuntimeRegistry};
use crate::store::WaypointStore;

pub(crate) struct ServiceInner {
    pub(crate) store: Arc<dyn WaypointStore>,
    pub(crate) limits: Arc<dyn LimitEvaluator>,
    pub(crate) backend: Arc<dyn RenderBackend>,
    pub(crate) actors: Arc<dyn ActorDirectory>,
    pub(crate) prompt: Arc<dyn PreferencePrompt>,
    pub(crate) listeners: Vec<Arc<dyn WaypointListener>>,
    pub(crate) config: WaypointConfig,
    ids: ProxyIdAllocator,
    registry: Mutex<RuntimeRegistry>,
    locks: Arc<OperationLocks>,
}

/// Owns every piece of per-process waypoint state and runs commands and
/// host events against it. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WaypointService {
    pub(crate) inner: Arc<ServiceInner>,
}

pub struct WaypointServiceBuilder {
    store: Arc<dyn WaypointStore>,
    backend: Arc<dyn RenderBackend>,
    actors: Arc<dyn ActorDirectory>,
    prompt: Arc<dyn PreferencePrompt>,
    limits: Option<Arc<dyn LimitEvaluator>>,
    listeners: Vec<Arc<dyn WaypointListener>>,
    config: WaypointConfig,
    ids: ProxyIdAllocator,
}

impl WaypointServiceBuilder {
    pub fn config(mut self, config: WaypointConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the static limits derived from the config.
    pub fn limits(mut self, limits: Arc<dyn LimitEvaluator>) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn WaypointListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn proxy_ids(mut self, ids: ProxyIdAllocator) -> Self {
        self.ids = ids;
        self
    }

    pub fn build(self) -> WaypointService {
        let limits = self
            .limits
            .unwrap_or_else(|| {
                Arc::new(self.config.static_limits()) as Arc<dyn LimitEvaluator>
            });
        log::info!(
            "waypoint service ready (configurable limit {}, selectable limit {})",
            self.config.configurable_limit,
            self.config.selectable_limit
        );
        WaypointService {
            inner: Arc::new(ServiceInner {
                store: self.store,
                limits,
                backend: self.backend,
                actors: self.actors,
                prompt: self.prompt,
                listeners: self.listeners,
                config: self.config,
                ids: self.ids,
                registry: Mutex::new(RuntimeRegistry::new()),
                locks: Arc::new(OperationLocks::new()),
            }),
        }
    }
}

impl WaypointService {
    pub fn builder(
        store: Arc<dyn WaypointStore>,
        backend: Arc<dyn RenderBackend>,
        actors: Arc<dyn ActorDirectory>,
        prompt: Arc<dyn PreferencePrompt>,
    ) -> WaypointServiceBuilder {
        WaypointServiceBuilder {
            store,
            backend,
            actors,
            prompt,
            limits: None,
            listeners: Vec::new(),
            config: WaypointConfig::default(),
            ids: ProxyIdAllocator::default(),
        }
    }

    pub fn config(&self) -> &WaypointConfig {
        &self.inner.config
    }

    /// Enter a command for `actor`. Fails fast if one is already running.
    pub(crate) fn begin(&self, actor: ActorId) -> Result<OperationGuard, CommandError> {
        self.inner.locks.try_acquire(actor).ok_or_else(|| {
            log::debug!("rejecting command for {actor}: another one is in flight");
            CommandError::Busy
        })
    }

    /// Enter a sequence for `actor`, waiting out any running command.
    pub(crate) async fn begin_waiting(&self, actor: ActorId) -> OperationGuard {
        self.inner.locks.acquire(actor).await
    }

    pub(crate) fn snapshot(&self, actor: ActorId) -> Option<ActorSnapshot> {
        self.inner.actors.snapshot(actor)
    }

    pub(crate) fn is_reachable(&self, actor: ActorId) -> bool {
        self.snapshot(actor).is_some()
    }

    /// Run `f` with the registry locked. The lock must never span an await.
    pub(crate) fn with_registry<R>(
        &self,
        f: impl FnOnce(&mut RuntimeRegistry, &RenderContext<'_>) -> R,
    ) -> R {
        let ctx = RenderContext {
            backend: self.inner.backend.as_ref(),
            listeners: &self.inner.listeners,
            ids: &self.inner.ids,
        };
        let mut registry = self.inner.registry.lock();
        f(&mut registry, &ctx)
    }

    /// Write a waypoint and notify listeners when a row changed.
    pub(crate) async fn persist(
        &self,
        actor: ActorId,
        name: &str,
        waypoint: &Waypoint,
        selected: bool,
    ) -> Result<u64, ExternalError> {
        let rows = self
            .inner
            .store
            .set_waypoint(actor, name, waypoint, selected)
            .await?;
        if rows > 0 {
            for listener in &self.inner.listeners {
                listener.on_waypoint_created(actor, name, waypoint);
            }
        }
        Ok(rows)
    }

    /// Deselect the oldest rendered waypoint unless `name` is already one
    /// of the rendered ones.
    pub(crate) async fn make_room(&self, actor: ActorId, name: &str) -> Result<(), ExternalError> {
        let key = lookup_key(name);
        let victim = self.with_registry(|registry, _| {
            if !registry.has_renderers(actor) || registry.contains(actor, &key) {
                return None;
            }
            registry.first_name(actor)
        });
        let Some(victim) = victim else {
            return Ok(());
        };

        if let Some(stored) = self.inner.store.get_waypoint(actor, &victim).await? {
            log::debug!("evicting '{}' for {} to make room for '{}'", stored.name, actor, name);
            self.persist(actor, &stored.name, &stored.waypoint, false)
                .await?;
        }
        self.reconcile(actor, vec![SelectionDelta::remove(victim)])
            .await?;
        Ok(())
    }

    /// Lower-cased names of the waypoints currently rendered for `actor`.
    pub fn active_names(&self, actor: ActorId) -> Vec<String> {
        self.with_registry(|registry, _| registry.names(actor))
    }

    pub fn renderer_count(&self, actor: ActorId) -> usize {
        self.with_registry(|registry, _| registry.renderer_count(actor))
    }

    pub fn renderer_state(&self, actor: ActorId, name: &str) -> Option<UpdaterState> {
        let key = lookup_key(name);
        self.with_registry(|registry, _| registry.rendered(actor, &key).map(|r| r.state()))
    }

    pub fn rendered_waypoint(&self, actor: ActorId, name: &str) -> Option<Waypoint> {
        let key = lookup_key(name);
        self.with_registry(|registry, _| {
            registry.rendered(actor, &key).map(|r| r.waypoint.clone())
        })
    }

    pub fn is_busy(&self, actor: ActorId) -> bool {
        self.inner.locks.is_held(actor)
    }

    pub fn registry_consistent(&self, actor: ActorId) -> bool {
        self.with_registry(|registry, _| registry.is_consistent(actor))
    }
}
