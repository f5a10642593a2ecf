use waypoint_core::{ActorId, Waypoint};
use waypoint_render::RendererInstance;

/// Observer of waypoint and render events. Called synchronously while the
/// runtime registry is locked, so implementations must not call back into
/// the service.
pub trait WaypointListener: Send + Sync {
    fn on_waypoint_created(&self, _actor: ActorId, _name: &str, _waypoint: &Waypoint) {}

    fn on_waypoint_deleted(&self, _actor: ActorId, _name: &str) {}

    fn on_render(&self, _renderer: &RendererInstance) {}

    fn on_derender(&self, _renderer: &RendererInstance) {}
}
