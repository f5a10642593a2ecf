use async_trait::async_trait;

use crate::error::ExternalError;
use crate::types::ActorId;

/// Policy deciding how many waypoints an actor may configure and how many
/// may be selected (rendered) at once.
///
/// Implementations may consult anything (permission tiers, a remote
/// service); the engine awaits both queries concurrently.
#[async_trait]
pub trait LimitEvaluator: Send + Sync {
    /// Maximum number of stored waypoints.
    async fn configured_limit(&self, actor: ActorId) -> Result<u32, ExternalError>;

    /// Maximum number of simultaneously selected waypoints.
    async fn selected_limit(&self, actor: ActorId) -> Result<u32, ExternalError>;
}

/// Fixed limits taken from configuration. Never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticLimitEvaluator {
    pub configured: u32,
    pub selected: u32,
}

impl StaticLimitEvaluator {
    pub fn new(configured: u32, selected: u32) -> Self {
        Self {
            configured,
            selected,
        }
    }
}

#[async_trait]
impl LimitEvaluator for StaticLimitEvaluator {
    async fn configured_limit(&self, _actor: ActorId) -> Result<u32, ExternalError> {
        Ok(self.configured)
    }

    async fn selected_limit(&self, _actor: ActorId) -> Result<u32, ExternalError> {
        Ok(self.selected)
    }
}
