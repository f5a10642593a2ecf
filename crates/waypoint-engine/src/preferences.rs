use waypoint_core::constants::{MARKER_DISTANCE_MAX, MARKER_DISTANCE_MIN, MARKER_DISTANCE_STEP};
use waypoint_core::text::normalize_display;
use waypoint_core::{ActorId, ExternalError, Preferences};

use crate::error::CommandError;
use crate::reconcile::SelectionDelta;
use crate::service::WaypointService;

/// Clamp a requested marker distance to the slider range and step.
pub fn snap_distance(requested: f64, fallback: f64) -> f64 {
    if !requested.is_finite() {
        return fallback;
    }
    let clamped = requested.clamp(MARKER_DISTANCE_MIN, MARKER_DISTANCE_MAX);
    let steps = ((clamped - MARKER_DISTANCE_MIN) / MARKER_DISTANCE_STEP).round();
    (MARKER_DISTANCE_MIN + steps * MARKER_DISTANCE_STEP).min(MARKER_DISTANCE_MAX)
}

impl WaypointService {
    /// `preferences` command: show the form pre-filled with the stored
    /// preferences. `None` when the actor closed it.
    pub async fn configure_preferences(
        &self,
        actor: ActorId,
    ) -> Result<Option<Preferences>, CommandError> {
        let _guard = self.begin(actor)?;
        if !self.is_reachable(actor) {
            return Err(CommandError::ActorOffline);
        }
        let current = self.inner.store.get_preferences(actor).await?;
        Ok(self.request_preferences(actor, current).await?)
    }

    /// Stored preferences, or the form when the actor has none yet.
    pub(crate) async fn ensure_preferences(
        &self,
        actor: ActorId,
    ) -> Result<Preferences, CommandError> {
        if let Some(preferences) = self.inner.store.get_preferences(actor).await? {
            return Ok(preferences);
        }
        self.request_preferences(actor, None)
            .await?
            .ok_or(CommandError::PreferencesRequired)
    }

    /// Ask until the actor submits a valid display format, declines, or
    /// disconnects. Saved preferences are applied to every selected waypoint.
    pub(crate) async fn request_preferences(
        &self,
        actor: ActorId,
        current: Option<Preferences>,
    ) -> Result<Option<Preferences>, ExternalError> {
        let mut draft = current.unwrap_or_default();
        loop {
            if !self.is_reachable(actor) {
                return Ok(None);
            }
            let Some(input) = self.inner.prompt.request(actor, &draft).await else {
                log::debug!("{actor} closed the preference form");
                return Ok(None);
            };
            if !self.is_reachable(actor) {
                return Ok(None);
            }

            let distance = snap_distance(input.distance, draft.distance);
            let display_format = match normalize_display(&input.display_format) {
                Ok(format) => format,
                Err(reason) => {
                    self.inner.prompt.rejected(actor, &reason);
                    draft = Preferences {
                        display_format: input.display_format,
                        distance,
                    };
                    continue;
                }
            };

            let preferences = Preferences {
                display_format,
                distance,
            };
            self.inner.store.set_preferences(actor, &preferences).await?;
            self.rerender_selected(actor).await?;
            log::info!("saved waypoint preferences for {actor}");
            return Ok(Some(preferences));
        }
    }

    /// Destroy and re-create every selected waypoint's renderer so new
    /// preferences apply.
    async fn rerender_selected(&self, actor: ActorId) -> Result<(), ExternalError> {
        let selected = self.inner.store.list_selected(actor).await?;
        if selected.is_empty() {
            return Ok(());
        }
        let mut deltas = Vec::with_capacity(selected.len() * 2);
        for entry in selected {
            deltas.push(SelectionDelta::remove(entry.name.clone()));
            deltas.push(SelectionDelta::set(entry.name, entry.waypoint, true));
        }
        self.reconcile(actor, deltas).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_distance() {
        assert_eq!(snap_distance(5.0, 1.0), 5.0);
        assert_eq!(snap_distance(5.5, 1.0), 5.0);
        assert_eq!(snap_distance(5.7, 1.0), 6.25);
        assert_eq!(snap_distance(-3.0, 1.0), 0.0);
        assert_eq!(snap_distance(99.0, 1.0), 16.0);
        assert_eq!(snap_distance(f64::NAN, 2.5), 2.5);
    }
}
