pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod host;
pub mod listener;
pub mod locks;
pub mod memory_store;
pub mod preferences;
pub mod reconcile;
pub mod registry;
pub mod service;
pub mod store;
pub mod test_harness;
pub mod throttle;

pub use commands::{
    DeleteOutcome, FaceOutcome, PageEntry, RenameOutcome, SetOutcome, ToggleOutcome, WaypointPage,
};
pub use error::CommandError;
pub use host::{ActorDirectory, PreferenceInput, PreferencePrompt};
pub use listener::WaypointListener;
pub use memory_store::MemoryStore;
pub use reconcile::SelectionDelta;
pub use service::{WaypointService, WaypointServiceBuilder};
pub use store::{NamedWaypoint, StoredWaypoint, WaypointStore};
pub use throttle::MovementPlan;
