use waypoint_core::{ActorId, ExternalError};

use crate::reconcile::SelectionDelta;
use crate::service::WaypointService;

impl WaypointService {
    /// Host hook for an actor coming online: render its selected waypoints.
    ///
    /// Waypoints selected beyond the current selected limit are persisted as
    /// deselected. A command already running for the actor is waited out.
    /// The sequence stops quietly if the actor leaves before it finishes.
    pub async fn on_actor_join(&self, actor: ActorId) -> Result<(), ExternalError> {
        if self.is_busy(actor) {
            log::debug!("join bootstrap for {actor} waiting on a running command");
        }
        let _guard = self.begin_waiting(actor).await;

        let (selected, selected_limit) = tokio::try_join!(
            self.inner.store.list_selected(actor),
            self.inner.limits.selected_limit(actor),
        )?;
        if selected.is_empty() {
            return Ok(());
        }
        if !self.is_reachable(actor) {
            return Ok(());
        }

        // Entity spawning on the client must settle before proxies ride it.
        tokio::time::sleep(self.inner.config.join_settle).await;
        if !self.is_reachable(actor) {
            log::debug!("{actor} left before join bootstrap finished");
            return Ok(());
        }

        let limit = selected_limit as usize;
        let mut deltas = Vec::with_capacity(selected.len().min(limit));
        for (index, entry) in selected.into_iter().enumerate() {
            if index >= limit {
                log::info!(
                    "deselecting '{}' for {}: over the selected limit of {}",
                    entry.name,
                    actor,
                    selected_limit
                );
                self.persist(actor, &entry.name, &entry.waypoint, false)
                    .await?;
            } else {
                deltas.push(SelectionDelta::set(entry.name, entry.waypoint, true));
            }
        }
        if !deltas.is_empty() {
            self.reconcile(actor, deltas).await?;
        }
        Ok(())
    }

    /// Host hook for an actor going offline.
    pub fn on_actor_quit(&self, actor: ActorId) {
        let destroyed = self.with_registry(|registry, ctx| {
            let destroyed = registry.destroy_all(ctx, actor);
            registry.forget_location(actor);
            destroyed
        });
        if destroyed > 0 {
            log::debug!("cleared {destroyed} renderer(s) for {actor}");
        }
    }

    /// Host hook for a respawn; the client drops entity links on respawn.
    pub fn on_actor_respawn(&self, actor: ActorId) {
        self.with_registry(|registry, ctx| {
            for renderer in registry.renderers(actor) {
                renderer.send_links(ctx.backend);
            }
        });
    }
}
