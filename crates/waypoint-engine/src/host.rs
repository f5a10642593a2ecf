use async_trait::async_trait;
use waypoint_core::{ActorId, ActorSnapshot, Preferences, ValidationError};

/// Live view of connected actors, provided by the host server.
pub trait ActorDirectory: Send + Sync {
    /// Current state of `actor`, or `None` once it is no longer reachable.
    fn snapshot(&self, actor: ActorId) -> Option<ActorSnapshot>;

    /// Turn the actor to the given yaw/pitch (degrees).
    fn set_rotation(&self, actor: ActorId, yaw: f64, pitch: f64);
}

/// Raw answer from the preference form, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceInput {
    pub display_format: String,
    pub distance: f64,
}

/// Interactive preference collection, e.g. a client-side form.
#[async_trait]
pub trait PreferencePrompt: Send + Sync {
    /// Ask the actor for preferences, pre-filled with `current`.
    /// `None` when the actor closes the form or disconnects.
    async fn request(&self, actor: ActorId, current: &Preferences) -> Option<PreferenceInput>;

    /// Tell the actor the last answer was rejected.
    fn rejected(&self, actor: ActorId, reason: &ValidationError);
}
