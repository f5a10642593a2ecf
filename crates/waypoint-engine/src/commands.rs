use std::fmt;

use glam::DVec3;
use waypoint_core::math::{clamp_coord, look_at};
use waypoint_core::text::{normalize_title, validate_name};
use waypoint_core::{ActorId, ValidationError, Waypoint};

use crate::error::CommandError;
use crate::reconcile::SelectionDelta;
use crate::service::WaypointService;

#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    pub name: String,
    pub waypoint: Waypoint,
}

impl fmt::Display for SetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.waypoint.rounded();
        write!(f, "Set waypoint {} at {}x, {}y {}z", self.name, x, y, z)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub name: String,
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deleted waypoint {}!", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub name: String,
    pub visible: bool,
}

impl fmt::Display for ToggleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.visible { "visible" } else { "hidden" };
        write!(f, "Your waypoint ({}) is now {}!", self.name, state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub name: String,
    pub title: String,
}

impl fmt::Display for RenameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated title of waypoint ({}) to {}!", self.name, self.title)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceOutcome {
    pub name: String,
    pub yaw: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    /// 1-based position across all pages.
    pub index: u64,
    pub name: String,
    pub waypoint: Waypoint,
    pub selected: bool,
}

/// One page of an actor's waypoints, ordered by name.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointPage {
    pub page: u64,
    pub pages: u64,
    pub total: u32,
    pub entries: Vec<PageEntry>,
}

impl WaypointService {
    /// Create or move a waypoint and make it the selected one.
    ///
    /// With `enforce_limits`, a new name is refused once the configured limit
    /// is reached. Selecting past the selected limit evicts the oldest
    /// rendered waypoint.
    pub async fn set_waypoint(
        &self,
        actor: ActorId,
        name: &str,
        title: &str,
        at: DVec3,
        enforce_limits: bool,
    ) -> Result<SetOutcome, CommandError> {
        let _guard = self.begin(actor)?;
        self.set_waypoint_locked(actor, name, title, at, enforce_limits)
            .await
    }

    /// Set a waypoint at the actor's block position. The title defaults to
    /// the name.
    pub async fn set_waypoint_here(
        &self,
        actor: ActorId,
        name: &str,
        title: Option<&str>,
    ) -> Result<SetOutcome, CommandError> {
        let _guard = self.begin(actor)?;
        let snapshot = self.snapshot(actor).ok_or(CommandError::ActorOffline)?;
        let at = snapshot.position.coords.floor();
        self.set_waypoint_locked(actor, name, title.unwrap_or(name), at, true)
            .await
    }

    async fn set_waypoint_locked(
        &self,
        actor: ActorId,
        name: &str,
        title: &str,
        at: DVec3,
        enforce_limits: bool,
    ) -> Result<SetOutcome, CommandError> {
        self.ensure_preferences(actor).await?;

        validate_name(name)?;
        let title = normalize_title(title)?;
        let waypoint = Waypoint::new(title, clamp_coord(at.x), at.y, clamp_coord(at.z));

        let store = &self.inner.store;
        let limits = &self.inner.limits;
        let (existing, configured_limit, selected_limit, configured, selected) = tokio::try_join!(
            store.get_waypoint(actor, name),
            limits.configured_limit(actor),
            limits.selected_limit(actor),
            store.count_all(actor),
            store.count_selected(actor),
        )?;

        if enforce_limits
            && existing.is_none()
            && u64::from(configured) + 1 > u64::from(configured_limit)
        {
            return Err(CommandError::LimitExceeded {
                limit: configured_limit,
            });
        }

        let name = existing.map_or_else(|| name.to_string(), |e| e.name);
        if u64::from(selected) + 1 > u64::from(selected_limit) {
            self.make_room(actor, &name).await?;
        }

        self.persist(actor, &name, &waypoint, true).await?;
        self.reconcile(actor, vec![SelectionDelta::set(name.clone(), waypoint.clone(), true)])
            .await?;
        log::info!("{actor} set waypoint '{name}'");
        Ok(SetOutcome { name, waypoint })
    }

    pub async fn delete_waypoint(
        &self,
        actor: ActorId,
        name: &str,
    ) -> Result<DeleteOutcome, CommandError> {
        let _guard = self.begin(actor)?;
        validate_name(name)?;

        let rows = self.inner.store.delete_waypoint(actor, name).await?;
        if rows == 0 {
            return Err(CommandError::NotFound {
                name: name.to_string(),
            });
        }
        self.reconcile(actor, vec![SelectionDelta::remove(name)])
            .await?;
        for listener in &self.inner.listeners {
            listener.on_waypoint_deleted(actor, name);
        }
        Ok(DeleteOutcome {
            name: name.to_string(),
        })
    }

    /// Flip one waypoint's visibility, or hide every selected one when no
    /// name is given.
    pub async fn toggle(
        &self,
        actor: ActorId,
        name: Option<&str>,
    ) -> Result<Vec<ToggleOutcome>, CommandError> {
        let _guard = self.begin(actor)?;
        match name {
            Some(name) => Ok(vec![self.toggle_one(actor, name).await?]),
            None => self.hide_all(actor).await,
        }
    }

    async fn toggle_one(&self, actor: ActorId, name: &str) -> Result<ToggleOutcome, CommandError> {
        validate_name(name)?;
        let stored = self
            .inner
            .store
            .get_waypoint(actor, name)
            .await?
            .ok_or_else(|| CommandError::NotFound {
                name: name.to_string(),
            })?;

        let visible = !stored.selected;
        if visible {
            let (selected_limit, selected) = tokio::try_join!(
                self.inner.limits.selected_limit(actor),
                self.inner.store.count_selected(actor),
            )?;
            if u64::from(selected) + 1 > u64::from(selected_limit) {
                self.make_room(actor, &stored.name).await?;
            }
        }

        self.persist(actor, &stored.name, &stored.waypoint, visible)
            .await?;
        self.reconcile(
            actor,
            vec![SelectionDelta::set(stored.name.clone(), stored.waypoint, visible)],
        )
        .await?;
        Ok(ToggleOutcome {
            name: stored.name,
            visible,
        })
    }

    async fn hide_all(&self, actor: ActorId) -> Result<Vec<ToggleOutcome>, CommandError> {
        let selected = self.inner.store.list_selected(actor).await?;
        if selected.is_empty() {
            return Err(CommandError::NoSelection);
        }

        let mut deltas = Vec::with_capacity(selected.len());
        let mut outcomes = Vec::with_capacity(selected.len());
        for entry in selected {
            self.persist(actor, &entry.name, &entry.waypoint, false)
                .await?;
            deltas.push(SelectionDelta::remove(entry.name.clone()));
            outcomes.push(ToggleOutcome {
                name: entry.name,
                visible: false,
            });
        }
        self.reconcile(actor, deltas).await?;
        Ok(outcomes)
    }

    /// Change a waypoint's title, re-rendering it if it is shown.
    pub async fn rename(
        &self,
        actor: ActorId,
        name: &str,
        title: &str,
    ) -> Result<RenameOutcome, CommandError> {
        let _guard = self.begin(actor)?;
        validate_name(name)?;
        let title = normalize_title(title)?;

        let stored = self
            .inner
            .store
            .get_waypoint(actor, name)
            .await?
            .ok_or_else(|| CommandError::NotFound {
                name: name.to_string(),
            })?;
        let waypoint = stored.waypoint.with_title(title.clone());
        self.persist(actor, &stored.name, &waypoint, stored.selected)
            .await?;
        if stored.selected {
            self.reconcile(
                actor,
                vec![SelectionDelta::set(stored.name.clone(), waypoint, true)],
            )
            .await?;
        }
        Ok(RenameOutcome {
            name: stored.name,
            title,
        })
    }

    /// Turn the actor to look at a waypoint.
    pub async fn face(&self, actor: ActorId, name: &str) -> Result<FaceOutcome, CommandError> {
        let _guard = self.begin(actor)?;
        validate_name(name)?;

        let stored = self
            .inner
            .store
            .get_waypoint(actor, name)
            .await?
            .ok_or_else(|| CommandError::NotFound {
                name: name.to_string(),
            })?;
        let snapshot = self.snapshot(actor).ok_or(CommandError::ActorOffline)?;

        let (yaw, pitch) = look_at(snapshot.eye_position(), stored.waypoint.position());
        self.inner.actors.set_rotation(actor, yaw, pitch);
        Ok(FaceOutcome {
            name: stored.name,
            yaw,
            pitch,
        })
    }

    /// List waypoints by page, 1-based. A page past the end falls back to
    /// the first page.
    pub async fn list(&self, actor: ActorId, page: i64) -> Result<WaypointPage, CommandError> {
        let _guard = self.begin(actor)?;
        if page < 1 {
            return Err(ValidationError::InvalidPage.into());
        }

        let page_size = u64::from(self.inner.config.list_page_size);
        let total = self.inner.store.count_all(actor).await?;
        let pages = u64::from(total).div_ceil(page_size);
        if total == 0 {
            return Ok(WaypointPage {
                page: 1,
                pages,
                total,
                entries: Vec::new(),
            });
        }

        let mut page = page as u64;
        if page > pages {
            page = 1;
        }
        let offset = (page - 1) * page_size;
        let rows = self
            .inner
            .store
            .list_page(actor, offset as u32, page_size as u32)
            .await?;
        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| PageEntry {
                index: offset + i as u64 + 1,
                name: row.name,
                waypoint: row.waypoint,
                selected: row.selected,
            })
            .collect();
        Ok(WaypointPage {
            page,
            pages,
            total,
            entries,
        })
    }

    /// Every waypoint name the actor owns, for completion.
    pub async fn waypoint_names(&self, actor: ActorId) -> Result<Vec<String>, CommandError> {
        Ok(self.inner.store.list_names(actor).await?)
    }
}
