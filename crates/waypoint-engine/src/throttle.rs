use glam::DVec3;
use waypoint_core::constants::TELEPORT_WORLD_CHANGE_DISTANCE_SQ;
use waypoint_core::{ActorId, Position, WorldId};

use crate::service::WaypointService;

/// What a movement event should do to an actor's renderers.
#[derive(Debug, Clone, PartialEq)]
pub enum MovementPlan {
    Skip,
    /// Update every renderer. `from_world` is `None` when a long teleport
    /// must be treated as a world change.
    Update { from_world: Option<WorldId> },
}

/// Decide how to handle a move from `from` to `to`.
pub fn plan_movement(
    from: &Position,
    to: &Position,
    teleported: bool,
    threshold_sq: f64,
    known: Option<DVec3>,
) -> MovementPlan {
    let same_world = from.world == to.world;

    if !teleported && same_world && threshold_sq > 0.0 {
        if let Some(known) = known {
            if known.distance_squared(to.coords) <= threshold_sq {
                return MovementPlan::Skip;
            }
        }
    }

    let far_teleport = teleported
        && same_world
        && from.distance_squared(to) > TELEPORT_WORLD_CHANGE_DISTANCE_SQ;
    MovementPlan::Update {
        from_world: if far_teleport {
            None
        } else {
            Some(from.world.clone())
        },
    }
}

impl WaypointService {
    /// Host hook for ordinary movement.
    pub fn on_actor_move(&self, actor: ActorId, from: &Position, to: &Position) {
        self.process_movement(actor, from, to, false);
    }

    /// Host hook for teleports, including cross-world ones.
    pub fn on_actor_teleport(&self, actor: ActorId, from: &Position, to: &Position) {
        self.process_movement(actor, from, to, true);
    }

    fn process_movement(&self, actor: ActorId, from: &Position, to: &Position, teleported: bool) {
        let threshold_sq = self.inner.config.movement_delta_sq;
        self.with_registry(|registry, ctx| {
            if !registry.has_renderers(actor) {
                return;
            }
            let plan = plan_movement(
                from,
                to,
                teleported,
                threshold_sq,
                registry.known_location(actor),
            );
            let MovementPlan::Update { from_world } = plan else {
                return;
            };
            for renderer in registry.renderers_mut(actor) {
                renderer.update(ctx.backend, from_world.as_ref(), Some(&to.world), to.coords);
            }
            registry.set_known_location(actor, to.coords);
        });
    }
}
