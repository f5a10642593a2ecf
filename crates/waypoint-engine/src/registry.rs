use std::collections::HashMap;
use std::sync::Arc;

use glam::DVec3;
use indexmap::IndexMap;
use waypoint_core::{ActorId, ProxyId};
use waypoint_render::{DestroyHook, ProxyIdAllocator, RenderBackend, RendererInstance};

use crate::listener::WaypointListener;

/// Collaborators a registry mutation may need.
pub struct RenderContext<'a> {
    pub backend: &'a dyn RenderBackend,
    pub listeners: &'a [Arc<dyn WaypointListener>],
    pub ids: &'a ProxyIdAllocator,
}

/// Active renderers, per actor.
///
/// `lookup` maps a lower-cased waypoint name to a renderer id; `renderers`
/// owns the instances. An id is in `renderers` iff its name is in `lookup`,
/// and an actor with no renderer has no entry in either map.
#[derive(Debug, Default)]
pub struct RuntimeRegistry {
    lookup: HashMap<ActorId, IndexMap<String, ProxyId>>,
    renderers: HashMap<ActorId, IndexMap<ProxyId, RendererInstance>>,
    /// Last position pushed to the actor's renderers.
    known_locations: HashMap<ActorId, DVec3>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_renderers(&self, actor: ActorId) -> bool {
        self.renderers.contains_key(&actor)
    }

    pub fn renderer_count(&self, actor: ActorId) -> usize {
        self.renderers.get(&actor).map_or(0, |r| r.len())
    }

    /// Renderer shown for `key` (lower-cased name).
    pub fn rendered(&self, actor: ActorId, key: &str) -> Option<&RendererInstance> {
        let id = self.lookup.get(&actor)?.get(key)?;
        self.renderers.get(&actor)?.get(id)
    }

    pub fn contains(&self, actor: ActorId, key: &str) -> bool {
        self.lookup
            .get(&actor)
            .is_some_and(|names| names.contains_key(key))
    }

    /// Rendered names in insertion order.
    pub fn names(&self, actor: ActorId) -> Vec<String> {
        self.lookup
            .get(&actor)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Oldest rendered name; the eviction candidate when making room.
    pub fn first_name(&self, actor: ActorId) -> Option<String> {
        self.lookup.get(&actor)?.keys().next().cloned()
    }

    pub fn renderers_mut(
        &mut self,
        actor: ActorId,
    ) -> impl Iterator<Item = &mut RendererInstance> + '_ {
        self.renderers
            .get_mut(&actor)
            .into_iter()
            .flat_map(|r| r.values_mut())
    }

    pub fn renderers(&self, actor: ActorId) -> impl Iterator<Item = &RendererInstance> + '_ {
        self.renderers
            .get(&actor)
            .into_iter()
            .flat_map(|r| r.values())
    }

    pub fn known_location(&self, actor: ActorId) -> Option<DVec3> {
        self.known_locations.get(&actor).copied()
    }

    pub fn set_known_location(&mut self, actor: ActorId, location: DVec3) {
        self.known_locations.insert(actor, location);
    }

    pub fn forget_location(&mut self, actor: ActorId) {
        self.known_locations.remove(&actor);
    }

    /// Register a freshly spawned renderer under `key`. Any renderer already
    /// registered under that key is destroyed first.
    pub fn insert(
        &mut self,
        ctx: &RenderContext<'_>,
        actor: ActorId,
        key: String,
        mut renderer: RendererInstance,
    ) {
        self.destroy_name(ctx, actor, &key);

        let id = renderer.id();
        renderer.push_destroy_hook(DestroyHook::ReleaseName(key.clone()));
        self.renderers
            .entry(actor)
            .or_default()
            .insert(id, renderer);
        self.lookup.entry(actor).or_default().insert(key, id);

        if let Some(renderer) = self.renderers.get(&actor).and_then(|r| r.get(&id)) {
            log::debug!(
                "rendering '{}' for {} as {}",
                renderer.waypoint.title,
                actor,
                id
            );
            for listener in ctx.listeners {
                listener.on_render(renderer);
            }
        }
    }

    /// Destroy one renderer. No-op when it is already gone.
    pub fn destroy(&mut self, ctx: &RenderContext<'_>, actor: ActorId, id: ProxyId) -> bool {
        let Some(renderers) = self.renderers.get_mut(&actor) else {
            return false;
        };
        let Some(mut renderer) = renderers.shift_remove(&id) else {
            return false;
        };
        if renderers.is_empty() {
            self.renderers.remove(&actor);
            self.known_locations.remove(&actor);
        }

        let lookup = &mut self.lookup;
        renderer.destroy(ctx.backend, |name| {
            if let Some(names) = lookup.get_mut(&actor) {
                if names.get(name) == Some(&id) {
                    names.shift_remove(name);
                }
                if names.is_empty() {
                    lookup.remove(&actor);
                }
            }
        });

        log::debug!("derendered {} for {}", id, actor);
        for listener in ctx.listeners {
            listener.on_derender(&renderer);
        }
        true
    }

    pub fn destroy_name(&mut self, ctx: &RenderContext<'_>, actor: ActorId, key: &str) -> bool {
        let id = self.lookup.get(&actor).and_then(|names| names.get(key)).copied();
        match id {
            Some(id) => self.destroy(ctx, actor, id),
            None => false,
        }
    }

    /// Destroy every renderer of `actor`. Returns how many were destroyed.
    pub fn destroy_all(&mut self, ctx: &RenderContext<'_>, actor: ActorId) -> usize {
        let ids: Vec<ProxyId> = self
            .renderers
            .get(&actor)
            .map(|r| r.keys().copied().collect())
            .unwrap_or_default();
        let destroyed = ids
            .into_iter()
            .filter(|id| self.destroy(ctx, actor, *id))
            .count();
        self.known_locations.remove(&actor);
        destroyed
    }

    /// Check the lookup/renderer correspondence for `actor`.
    pub fn is_consistent(&self, actor: ActorId) -> bool {
        let names = self.lookup.get(&actor);
        let renderers = self.renderers.get(&actor);
        match (names, renderers) {
            (None, None) => true,
            (Some(names), Some(renderers)) => {
                !names.is_empty()
                    && names.len() == renderers.len()
                    && names.values().all(|id| renderers.contains_key(id))
            }
            _ => false,
        }
    }
}
