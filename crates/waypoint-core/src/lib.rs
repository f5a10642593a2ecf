pub mod config;
pub mod constants;
pub mod error;
pub mod limits;
pub mod math;
pub mod text;
pub mod types;
pub mod waypoint;

pub use config::WaypointConfig;
pub use error::{ConfigError, ExternalError, ValidationError};
pub use limits::{LimitEvaluator, StaticLimitEvaluator};
pub use types::{ActorId, ActorSnapshot, EntityId, Position, Preferences, ProxyId, WorldId};
pub use waypoint::Waypoint;
