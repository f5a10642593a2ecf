use std::fmt;
use std::sync::Arc;

use glam::DVec3;
use uuid::Uuid;

use crate::constants::{DEFAULT_DISPLAY_FORMAT, DEFAULT_MARKER_DISTANCE};

/// Stable actor identity. Survives reconnects; never a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Runtime entity id of an online actor, as seen by its own client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// Identity of a visual proxy entity. Unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u64);

impl From<ProxyId> for EntityId {
    fn from(id: ProxyId) -> Self {
        EntityId(id.0)
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy#{}", self.0)
    }
}

/// Identifies a world (dimension) hosted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorldId(pub Arc<str>);

impl WorldId {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in a specific world.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub world: WorldId,
    pub coords: DVec3,
}

impl Position {
    pub fn new(world: WorldId, coords: DVec3) -> Self {
        Self { world, coords }
    }

    /// Squared distance ignoring worlds.
    pub fn distance_squared(&self, other: &Position) -> f64 {
        self.coords.distance_squared(other.coords)
    }
}

/// What the engine needs to know about an online actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub actor: ActorId,
    pub entity: EntityId,
    pub position: Position,
    /// Height of the eyes above `position`.
    pub eye_height: f64,
}

impl ActorSnapshot {
    pub fn eye_position(&self) -> DVec3 {
        self.position.coords + DVec3::new(0.0, self.eye_height, 0.0)
    }
}

/// Per-actor rendering preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    /// Label format containing `{TITLE}` and `{DISTANCE}` placeholders.
    pub display_format: String,
    /// How far from the actor the marker floats. Larger reads bigger.
    pub distance: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            display_format: DEFAULT_DISPLAY_FORMAT.to_string(),
            distance: DEFAULT_MARKER_DISTANCE,
        }
    }
}
