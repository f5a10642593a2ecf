use indexmap::{IndexMap, IndexSet};
use waypoint_core::text::lookup_key;
use waypoint_core::{ActorId, ExternalError, Waypoint};
use waypoint_render::RendererInstance;

use crate::registry::RuntimeRegistry;
use crate::service::WaypointService;

/// Desired render state for one waypoint name.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDelta {
    pub name: String,
    /// `None` forces removal; otherwise the waypoint and whether it is
    /// selected.
    pub value: Option<(Waypoint, bool)>,
}

impl SelectionDelta {
    pub fn remove(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn set(name: impl Into<String>, waypoint: Waypoint, selected: bool) -> Self {
        Self {
            name: name.into(),
            value: Some((waypoint, selected)),
        }
    }
}

/// Renderer changes for one reconcile call, keyed by lower-cased name.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ReconcilePlan {
    pub remove: IndexSet<String>,
    pub add: IndexMap<String, Waypoint>,
}

/// Split `deltas` into removals and additions, in order.
///
/// A removal cancels any earlier addition of the same name. An addition is
/// skipped when an equal waypoint is already rendered and the name is not
/// also being removed in this call.
pub(crate) fn plan(
    registry: &RuntimeRegistry,
    actor: ActorId,
    deltas: Vec<SelectionDelta>,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    for delta in deltas {
        let key = lookup_key(&delta.name);
        match delta.value {
            Some((waypoint, true)) => {
                let unchanged = !plan.remove.contains(&key)
                    && registry
                        .rendered(actor, &key)
                        .is_some_and(|r| r.waypoint.approx_eq(&waypoint));
                if unchanged {
                    plan.add.shift_remove(&key);
                } else {
                    plan.add.insert(key, waypoint);
                }
            }
            None | Some((_, false)) => {
                plan.add.shift_remove(&key);
                plan.remove.insert(key);
            }
        }
    }
    plan
}

impl WaypointService {
    /// Bring the actor's renderers in line with `deltas`. Returns how many
    /// renderers were created.
    ///
    /// Removals happen first, so replacing a waypoint under the same name is a
    /// single re-render. Additions are dropped silently when the actor has no
    /// preferences or went offline while they were fetched.
    pub async fn reconcile(
        &self,
        actor: ActorId,
        deltas: Vec<SelectionDelta>,
    ) -> Result<usize, ExternalError> {
        let plan = self.with_registry(|registry, ctx| {
            let plan = plan(registry, actor, deltas);
            for key in &plan.remove {
                registry.destroy_name(ctx, actor, key);
            }
            plan
        });
        if plan.add.is_empty() {
            return Ok(0);
        }

        let Some(preferences) = self.inner.store.get_preferences(actor).await? else {
            log::debug!("not rendering for {actor}: no preferences");
            return Ok(0);
        };
        let Some(viewer) = self.snapshot(actor) else {
            log::debug!("not rendering for {actor}: actor is offline");
            return Ok(0);
        };

        let created = plan.add.len();
        self.with_registry(|registry, ctx| {
            for (key, waypoint) in plan.add {
                let renderer =
                    RendererInstance::spawn(waypoint, &viewer, &preferences, ctx.ids, ctx.backend);
                registry.insert(ctx, actor, key, renderer);
            }
            registry.set_known_location(actor, viewer.position.coords);
        });
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RenderContext;
    use glam::DVec3;
    use waypoint_core::{ActorSnapshot, EntityId, Position, Preferences, WorldId};
    use waypoint_render::test_harness::RecordingBackend;
    use waypoint_render::ProxyIdAllocator;

    fn registry_with(actor: ActorId, name: &str, waypoint: &Waypoint) -> RuntimeRegistry {
        let backend = RecordingBackend::new();
        let ids = ProxyIdAllocator::default();
        let ctx = RenderContext {
            backend: &backend,
            listeners: &[],
            ids: &ids,
        };
        let viewer = ActorSnapshot {
            actor,
            entity: EntityId(1),
            position: Position::new(WorldId::new("overworld"), DVec3::ZERO),
            eye_height: 1.62,
        };
        let mut registry = RuntimeRegistry::new();
        let renderer = RendererInstance::spawn(
            waypoint.clone(),
            &viewer,
            &Preferences::default(),
            &ids,
            &backend,
        );
        registry.insert(&ctx, actor, lookup_key(name), renderer);
        registry
    }

    #[test]
    fn test_plan_skips_identical_rendered_waypoint() {
        let actor = ActorId::new_v4();
        let home = Waypoint::new("Home", 10.0, 64.0, 10.0);
        let registry = registry_with(actor, "home", &home);

        let nudged = Waypoint::new("Home", 10.00001, 64.0, 10.0);
        let plan = plan(&registry, actor, vec![SelectionDelta::set("HOME", nudged, true)]);
        assert!(plan.add.is_empty());
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn test_plan_replaces_changed_waypoint() {
        let actor = ActorId::new_v4();
        let registry = registry_with(actor, "home", &Waypoint::new("Home", 10.0, 64.0, 10.0));

        let moved = Waypoint::new("Home", 20.0, 64.0, 10.0);
        let plan = plan(
            &registry,
            actor,
            vec![SelectionDelta::set("home", moved.clone(), true)],
        );
        assert_eq!(plan.add.get("home"), Some(&moved));
    }

    #[test]
    fn test_plan_remove_then_add_rerenders() {
        let actor = ActorId::new_v4();
        let home = Waypoint::new("Home", 10.0, 64.0, 10.0);
        let registry = registry_with(actor, "home", &home);

        let plan = plan(
            &registry,
            actor,
            vec![
                SelectionDelta::remove("home"),
                SelectionDelta::set("home", home.clone(), true),
            ],
        );
        assert!(plan.remove.contains("home"));
        assert_eq!(plan.add.get("home"), Some(&home));
    }

    #[test]
    fn test_plan_later_removal_cancels_add() {
        let actor = ActorId::new_v4();
        let registry = RuntimeRegistry::new();

        let plan = plan(
            &registry,
            actor,
            vec![
                SelectionDelta::set("Mine", Waypoint::new("Mine", 0.0, 0.0, 0.0), true),
                SelectionDelta::set("mine", Waypoint::new("Mine", 0.0, 0.0, 0.0), false),
            ],
        );
        assert!(plan.add.is_empty());
        assert!(plan.remove.contains("mine"));
    }
}
