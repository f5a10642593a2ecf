use async_trait::async_trait;
use waypoint_core::{ActorId, ExternalError, Preferences, Waypoint};

/// A persisted waypoint as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWaypoint {
    pub waypoint: Waypoint,
    /// Canonical (case-preserved) name.
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedWaypoint {
    pub waypoint: Waypoint,
    pub name: String,
}

/// Persistent waypoint and preference storage, keyed by actor identity.
///
/// Names are matched case-insensitively and stored case-preserving;
/// `(actor, name)` is unique.
#[async_trait]
pub trait WaypointStore: Send + Sync {
    async fn get_preferences(&self, actor: ActorId) -> Result<Option<Preferences>, ExternalError>;

    async fn set_preferences(
        &self,
        actor: ActorId,
        preferences: &Preferences,
    ) -> Result<(), ExternalError>;

    async fn get_waypoint(
        &self,
        actor: ActorId,
        name: &str,
    ) -> Result<Option<StoredWaypoint>, ExternalError>;

    /// Insert or update. Returns the number of rows changed.
    async fn set_waypoint(
        &self,
        actor: ActorId,
        name: &str,
        waypoint: &Waypoint,
        selected: bool,
    ) -> Result<u64, ExternalError>;

    /// Returns the number of rows removed.
    async fn delete_waypoint(&self, actor: ActorId, name: &str) -> Result<u64, ExternalError>;

    /// Selected waypoints, most recently updated first.
    async fn list_selected(&self, actor: ActorId) -> Result<Vec<NamedWaypoint>, ExternalError>;

    async fn list_page(
        &self,
        actor: ActorId,
        offset: u32,
        length: u32,
    ) -> Result<Vec<StoredWaypoint>, ExternalError>;

    async fn list_names(&self, actor: ActorId) -> Result<Vec<String>, ExternalError>;

    async fn count_all(&self, actor: ActorId) -> Result<u32, ExternalError>;

    async fn count_selected(&self, actor: ActorId) -> Result<u32, ExternalError>;
}
