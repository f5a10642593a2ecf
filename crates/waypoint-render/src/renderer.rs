use std::fmt;

use glam::DVec3;
use waypoint_core::constants::{MARKER_SCALE, MARKER_SEAT_Y_OFFSET, PROXY_BOUNDING_BOX};
use waypoint_core::math::marker_placement;
use waypoint_core::text::render_label;
use waypoint_core::{ActorId, ActorSnapshot, EntityId, Preferences, ProxyId, Waypoint, WorldId};

use crate::backend::{
    EntityLink, LinkKind, Metadata, MetadataKey, MetadataValue, ProxyKind, ProxySpawn,
    RenderBackend,
};
use crate::proxy::ProxyIdAllocator;

/// Position-update state of a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    /// Tracking the viewer normally.
    Movement,
    /// Graphics hidden after a world change; the next update re-shows them.
    /// Re-spawning during the transition screen does not render on the client.
    WorldChange,
}

/// Handler run exactly once when a renderer is destroyed, in registration
/// order.
pub enum DestroyHook {
    /// Drop this (lower-cased) name from the owner's name lookup.
    ReleaseName(String),
    Custom(Box<dyn FnOnce(&RendererInstance) + Send>),
}

impl fmt::Debug for DestroyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestroyHook::ReleaseName(name) => f.debug_tuple("ReleaseName").field(name).finish(),
            DestroyHook::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One waypoint marker shown to one viewer.
///
/// Two proxies are used: an invisible carrier rides the viewer, and the
/// labelled marker rides the carrier at a seat offset pointing toward the
/// waypoint.
#[derive(Debug)]
pub struct RendererInstance {
    pub waypoint: Waypoint,
    pub viewer: ActorId,
    pub viewer_entity: EntityId,
    pub viewer_eye_height: f64,
    /// How far from the viewer the marker floats.
    pub distance: f64,
    pub format: String,
    pub carrier_id: ProxyId,
    pub marker_id: ProxyId,
    state: UpdaterState,
    destroy_hooks: Vec<DestroyHook>,
}

impl RendererInstance {
    /// Allocate both proxies, show them and push the first position update.
    pub fn spawn(
        waypoint: Waypoint,
        viewer: &ActorSnapshot,
        preferences: &Preferences,
        ids: &ProxyIdAllocator,
        backend: &dyn RenderBackend,
    ) -> Self {
        let mut renderer = Self {
            waypoint,
            viewer: viewer.actor,
            viewer_entity: viewer.entity,
            viewer_eye_height: viewer.eye_height,
            distance: preferences.distance,
            format: preferences.display_format.clone(),
            carrier_id: ids.next_id(),
            marker_id: ids.next_id(),
            state: UpdaterState::Movement,
            destroy_hooks: Vec::new(),
        };
        renderer.show_graphic(backend, viewer.eye_position());
        let world = &viewer.position.world;
        renderer.update(backend, Some(world), Some(world), viewer.position.coords);
        renderer
    }

    /// Registry key of this renderer.
    pub fn id(&self) -> ProxyId {
        self.marker_id
    }

    pub fn state(&self) -> UpdaterState {
        self.state
    }

    pub fn push_destroy_hook(&mut self, hook: DestroyHook) {
        self.destroy_hooks.push(hook);
    }

    pub fn pending_destroy_hooks(&self) -> usize {
        self.destroy_hooks.len()
    }

    fn links(&self) -> [EntityLink; 2] {
        [
            EntityLink::new(
                self.carrier_id.into(),
                self.marker_id.into(),
                LinkKind::Passenger,
            ),
            EntityLink::new(self.viewer_entity, self.carrier_id.into(), LinkKind::Rider),
        ]
    }

    pub fn show_graphic(&self, backend: &dyn RenderBackend, eye: DVec3) {
        let carrier_metadata: Metadata = vec![
            (MetadataKey::Invisible, MetadataValue::Flag(true)),
            (MetadataKey::BoundingBoxWidth, MetadataValue::Float(PROXY_BOUNDING_BOX)),
            (MetadataKey::BoundingBoxHeight, MetadataValue::Float(PROXY_BOUNDING_BOX)),
            (MetadataKey::RiderRotationLocked, MetadataValue::Byte(1)),
        ];
        backend.spawn(
            self.viewer,
            ProxySpawn {
                proxy: self.carrier_id,
                kind: ProxyKind::Carrier,
                position: DVec3::ZERO,
                velocity: DVec3::ZERO,
                metadata: carrier_metadata,
                attributes: Vec::new(),
                links: Vec::new(),
            },
        );

        let marker_metadata: Metadata = vec![
            (MetadataKey::Immobile, MetadataValue::Flag(true)),
            (MetadataKey::Scale, MetadataValue::Float(MARKER_SCALE)),
            (MetadataKey::BoundingBoxWidth, MetadataValue::Float(PROXY_BOUNDING_BOX)),
            (MetadataKey::BoundingBoxHeight, MetadataValue::Float(PROXY_BOUNDING_BOX)),
            (MetadataKey::AlwaysShowNametag, MetadataValue::Byte(1)),
            (MetadataKey::BlockHidden, MetadataValue::Flag(true)),
        ];
        backend.spawn(
            self.viewer,
            ProxySpawn {
                proxy: self.marker_id,
                kind: ProxyKind::Marker,
                position: eye,
                velocity: DVec3::ZERO,
                metadata: marker_metadata,
                attributes: Vec::new(),
                links: self.links().to_vec(),
            },
        );
    }

    pub fn hide_graphic(&self, backend: &dyn RenderBackend) {
        backend.despawn(self.viewer, self.marker_id);
        backend.despawn(self.viewer, self.carrier_id);
    }

    /// Re-send both links. Respawning resets links on the client regardless
    /// of position.
    pub fn send_links(&self, backend: &dyn RenderBackend) {
        for link in self.links() {
            backend.send_link(self.viewer, link);
        }
    }

    /// React to the viewer moving to `to` in `to_world`.
    pub fn update(
        &mut self,
        backend: &dyn RenderBackend,
        from_world: Option<&WorldId>,
        to_world: Option<&WorldId>,
        to: DVec3,
    ) {
        match self.state {
            UpdaterState::Movement => {
                if from_world != to_world {
                    log::debug!(
                        "hiding {} for {} until the world change settles",
                        self.marker_id,
                        self.viewer
                    );
                    self.state = UpdaterState::WorldChange;
                    self.hide_graphic(backend);
                    return;
                }

                let placement = marker_placement(to, self.waypoint.position(), self.distance);
                let seat = placement.offset + DVec3::new(0.0, MARKER_SEAT_Y_OFFSET, 0.0);
                let label = render_label(&self.format, &self.waypoint.title, placement.distance);
                backend.set_metadata(
                    self.viewer,
                    self.marker_id,
                    vec![
                        (MetadataKey::RiderSeatPosition, MetadataValue::Vec3(seat)),
                        (MetadataKey::Nametag, MetadataValue::String(label)),
                    ],
                );
            }
            UpdaterState::WorldChange => {
                let eye = to + DVec3::new(0.0, self.viewer_eye_height, 0.0);
                log::debug!("re-showing {} for {}", self.marker_id, self.viewer);
                self.show_graphic(backend, eye);
                self.state = UpdaterState::Movement;
            }
        }
    }

    /// Hide both proxies and run every destroy hook once, in order.
    ///
    /// `release_name` handles `DestroyHook::ReleaseName`. Calling this again
    /// re-sends the despawns but runs no hook.
    pub fn destroy(&mut self, backend: &dyn RenderBackend, mut release_name: impl FnMut(&str)) {
        self.hide_graphic(backend);
        let hooks = std::mem::take(&mut self.destroy_hooks);
        for hook in hooks {
            match hook {
                DestroyHook::ReleaseName(name) => release_name(&name),
                DestroyHook::Custom(handler) => handler(&*self),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::{BackendCall, RecordingBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use waypoint_core::Position;

    fn viewer(world: &WorldId, at: DVec3) -> ActorSnapshot {
        ActorSnapshot {
            actor: ActorId::new_v4(),
            entity: EntityId(7),
            position: Position::new(world.clone(), at),
            eye_height: 1.62,
        }
    }

    fn spawn_at(backend: &RecordingBackend, world: &WorldId) -> RendererInstance {
        RendererInstance::spawn(
            Waypoint::new("Home", 30.0, 64.0, 40.0),
            &viewer(world, DVec3::new(0.0, 64.0, 0.0)),
            &Preferences::default(),
            &ProxyIdAllocator::starting_at(100),
            backend,
        )
    }

    #[test]
    fn test_spawn_shows_both_proxies_and_positions_marker() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let renderer = spawn_at(&backend, &world);

        assert_eq!(renderer.carrier_id, ProxyId(100));
        assert_eq!(renderer.marker_id, ProxyId(101));
        assert_eq!(renderer.state(), UpdaterState::Movement);
        assert_eq!(backend.spawn_count(), 2);
        assert_eq!(backend.metadata_count(), 1);
        assert_eq!(
            backend.last_label(renderer.marker_id).as_deref(),
            Some("§bHome§d [§550m§d]")
        );
    }

    #[test]
    fn test_marker_spawn_carries_links() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let renderer = spawn_at(&backend, &world);

        let marker = backend
            .calls()
            .into_iter()
            .find_map(|call| match call {
                BackendCall::Spawn(_, spawn) if spawn.kind == ProxyKind::Marker => Some(spawn),
                _ => None,
            })
            .expect("marker spawned");
        assert_eq!(marker.links.len(), 2);
        assert_eq!(marker.links[0].parent, renderer.carrier_id.into());
        assert_eq!(marker.links[0].kind, LinkKind::Passenger);
        assert_eq!(marker.links[1].parent, EntityId(7));
        assert_eq!(marker.links[1].kind, LinkKind::Rider);
    }

    #[test]
    fn test_same_world_update_stays_in_movement() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let mut renderer = spawn_at(&backend, &world);
        backend.clear();

        renderer.update(&backend, Some(&world), Some(&world), DVec3::new(30.0, 64.0, 0.0));
        assert_eq!(renderer.state(), UpdaterState::Movement);
        assert_eq!(backend.metadata_count(), 1);
        assert_eq!(backend.spawn_count(), 0);
        assert_eq!(
            backend.last_label(renderer.marker_id).as_deref(),
            Some("§bHome§d [§540m§d]")
        );
    }

    #[test]
    fn test_label_distance_with_height_difference() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let preferences = Preferences {
            display_format: "{DISTANCE}".into(),
            distance: 5.0,
        };
        let renderer = RendererInstance::spawn(
            Waypoint::new("Tower", 10.0, 74.0, 0.0),
            &viewer(&world, DVec3::new(0.0, 64.0, 0.0)),
            &preferences,
            &ProxyIdAllocator::starting_at(100),
            &backend,
        );
        assert_eq!(backend.last_label(renderer.marker_id).as_deref(), Some("12"));
    }

    #[test]
    fn test_world_change_round_trip() {
        let backend = RecordingBackend::new();
        let world1 = WorldId::new("overworld");
        let world2 = WorldId::new("nether");
        let mut renderer = spawn_at(&backend, &world1);
        backend.clear();

        renderer.update(&backend, Some(&world1), Some(&world2), DVec3::ZERO);
        assert_eq!(renderer.state(), UpdaterState::WorldChange);
        assert_eq!(backend.despawn_count(), 2);
        assert_eq!(backend.metadata_count(), 0);
        backend.clear();

        renderer.update(&backend, Some(&world2), Some(&world2), DVec3::new(5.0, 70.0, 5.0));
        assert_eq!(renderer.state(), UpdaterState::Movement);
        assert_eq!(backend.spawn_count(), 2);
        assert_eq!(backend.metadata_count(), 0);
    }

    #[test]
    fn test_missing_from_world_counts_as_world_change() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let mut renderer = spawn_at(&backend, &world);

        renderer.update(&backend, None, Some(&world), DVec3::ZERO);
        assert_eq!(renderer.state(), UpdaterState::WorldChange);
    }

    #[test]
    fn test_send_links_keeps_state() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let renderer = spawn_at(&backend, &world);
        backend.clear();

        renderer.send_links(&backend);
        assert_eq!(backend.link_count(), 2);
        assert_eq!(renderer.state(), UpdaterState::Movement);
    }

    #[test]
    fn test_destroy_runs_hooks_once_in_order() {
        let backend = RecordingBackend::new();
        let world = WorldId::new("overworld");
        let mut renderer = spawn_at(&backend, &world);
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let custom_runs = Arc::new(AtomicUsize::new(0));

        renderer.push_destroy_hook(DestroyHook::ReleaseName("home".into()));
        let runs = custom_runs.clone();
        let seen = order.clone();
        renderer.push_destroy_hook(DestroyHook::Custom(Box::new(move |r| {
            runs.fetch_add(1, Ordering::SeqCst);
            seen.lock().push(format!("custom:{}", r.waypoint.title));
        })));
        backend.clear();

        let released = order.clone();
        renderer.destroy(&backend, |name| released.lock().push(format!("release:{name}")));
        assert_eq!(backend.despawn_count(), 2);
        assert_eq!(
            *order.lock(),
            vec!["release:home".to_string(), "custom:Home".to_string()]
        );

        renderer.destroy(&backend, |_| panic!("hook ran twice"));
        assert_eq!(custom_runs.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.pending_destroy_hooks(), 0);
    }
}
