use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use waypoint_core::{ActorId, ExternalError, Preferences, Waypoint};

use crate::store::{NamedWaypoint, StoredWaypoint, WaypointStore};

#[derive(Debug, Clone)]
struct Record {
    name: String,
    waypoint: Waypoint,
    selected: bool,
    updated_at: u64,
}

#[derive(Debug, Default)]
struct Tables {
    waypoints: HashMap<ActorId, Vec<Record>>,
    preferences: HashMap<ActorId, Preferences>,
}

/// In-process store. `updated_at` is a logical clock so ordering is
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: AtomicU64,
    failing: AtomicBool,
}

#[derive(Debug, thiserror::Error)]
#[error("store unavailable")]
struct Unavailable;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, op: &str) -> Result<(), ExternalError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ExternalError::new(op, Unavailable));
        }
        Ok(())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn find<'a>(records: &'a [Record], name: &str) -> Option<&'a Record> {
    records.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

fn stored(record: &Record) -> StoredWaypoint {
    StoredWaypoint {
        waypoint: record.waypoint.clone(),
        name: record.name.clone(),
        selected: record.selected,
    }
}

#[async_trait]
impl WaypointStore for MemoryStore {
    async fn get_preferences(&self, actor: ActorId) -> Result<Option<Preferences>, ExternalError> {
        self.check("get_preferences")?;
        Ok(self.tables.lock().preferences.get(&actor).cloned())
    }

    async fn set_preferences(
        &self,
        actor: ActorId,
        preferences: &Preferences,
    ) -> Result<(), ExternalError> {
        self.check("set_preferences")?;
        self.tables
            .lock()
            .preferences
            .insert(actor, preferences.clone());
        Ok(())
    }

    async fn get_waypoint(
        &self,
        actor: ActorId,
        name: &str,
    ) -> Result<Option<StoredWaypoint>, ExternalError> {
        self.check("get_waypoint")?;
        let tables = self.tables.lock();
        Ok(tables
            .waypoints
            .get(&actor)
            .and_then(|records| find(records, name))
            .map(stored))
    }

    async fn set_waypoint(
        &self,
        actor: ActorId,
        name: &str,
        waypoint: &Waypoint,
        selected: bool,
    ) -> Result<u64, ExternalError> {
        self.check("set_waypoint")?;
        let updated_at = self.tick();
        let mut tables = self.tables.lock();
        let records = tables.waypoints.entry(actor).or_default();
        match records
            .iter_mut()
            .find(|r| r.name.eq_ignore_ascii_case(name))
        {
            Some(record) => {
                record.waypoint = waypoint.clone();
                record.selected = selected;
                record.updated_at = updated_at;
            }
            None => records.push(Record {
                name: name.to_string(),
                waypoint: waypoint.clone(),
                selected,
                updated_at,
            }),
        }
        Ok(1)
    }

    async fn delete_waypoint(&self, actor: ActorId, name: &str) -> Result<u64, ExternalError> {
        self.check("delete_waypoint")?;
        let mut tables = self.tables.lock();
        let Some(records) = tables.waypoints.get_mut(&actor) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|r| !r.name.eq_ignore_ascii_case(name));
        Ok((before - records.len()) as u64)
    }

    async fn list_selected(&self, actor: ActorId) -> Result<Vec<NamedWaypoint>, ExternalError> {
        self.check("list_selected")?;
        let tables = self.tables.lock();
        let mut selected: Vec<&Record> = tables
            .waypoints
            .get(&actor)
            .map(|records| records.iter().filter(|r| r.selected).collect())
            .unwrap_or_default();
        selected.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(selected
            .into_iter()
            .map(|r| NamedWaypoint {
                waypoint: r.waypoint.clone(),
                name: r.name.clone(),
            })
            .collect())
    }

    async fn list_page(
        &self,
        actor: ActorId,
        offset: u32,
        length: u32,
    ) -> Result<Vec<StoredWaypoint>, ExternalError> {
        self.check("list_page")?;
        let tables = self.tables.lock();
        let mut records: Vec<&Record> = tables
            .waypoints
            .get(&actor)
            .map(|records| records.iter().collect())
            .unwrap_or_default();
        records.sort_by_key(|r| r.name.to_lowercase());
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(length as usize)
            .map(stored)
            .collect())
    }

    async fn list_names(&self, actor: ActorId) -> Result<Vec<String>, ExternalError> {
        self.check("list_names")?;
        let tables = self.tables.lock();
        let mut names: Vec<String> = tables
            .waypoints
            .get(&actor)
            .map(|records| records.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default();
        names.sort_by_key(|n| n.to_lowercase());
        Ok(names)
    }

    async fn count_all(&self, actor: ActorId) -> Result<u32, ExternalError> {
        self.check("count_all")?;
        let tables = self.tables.lock();
        Ok(tables.waypoints.get(&actor).map_or(0, |r| r.len() as u32))
    }

    async fn count_selected(&self, actor: ActorId) -> Result<u32, ExternalError> {
        self.check("count_selected")?;
        let tables = self.tables.lock();
        Ok(tables
            .waypoints
            .get(&actor)
            .map_or(0, |r| r.iter().filter(|r| r.selected).count() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_names_are_case_insensitive_and_preserved() {
        let store = MemoryStore::new();
        let actor = ActorId::new_v4();
        store
            .set_waypoint(actor, "Home", &Waypoint::new("Home", 1.0, 2.0, 3.0), true)
            .await
            .expect("set");
        store
            .set_waypoint(actor, "HOME", &Waypoint::new("Base", 4.0, 5.0, 6.0), false)
            .await
            .expect("update");

        let found = store.get_waypoint(actor, "home").await.expect("get").expect("exists");
        assert_eq!(found.name, "Home");
        assert_eq!(found.waypoint.title, "Base");
        assert!(!found.selected);
        assert_eq!(store.count_all(actor).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_list_selected_most_recent_first() {
        let store = MemoryStore::new();
        let actor = ActorId::new_v4();
        for name in ["a", "b", "c"] {
            store
                .set_waypoint(actor, name, &Waypoint::new(name, 0.0, 0.0, 0.0), true)
                .await
                .expect("set");
        }
        store
            .set_waypoint(actor, "b", &Waypoint::new("b", 0.0, 0.0, 0.0), false)
            .await
            .expect("deselect");

        let names: Vec<String> = store
            .list_selected(actor)
            .await
            .expect("list")
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["c", "a"]);
        assert_eq!(store.count_selected(actor).await.expect("count"), 2);
    }

    #[tokio::test]
    async fn test_list_page_and_delete() {
        let store = MemoryStore::new();
        let actor = ActorId::new_v4();
        for name in ["delta", "Alpha", "charlie", "bravo"] {
            store
                .set_waypoint(actor, name, &Waypoint::new(name, 0.0, 0.0, 0.0), false)
                .await
                .expect("set");
        }
        let page = store.list_page(actor, 1, 2).await.expect("page");
        let names: Vec<&str> = page.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["bravo", "charlie"]);

        assert_eq!(store.delete_waypoint(actor, "ALPHA").await.expect("delete"), 1);
        assert_eq!(store.delete_waypoint(actor, "alpha").await.expect("delete"), 0);
        assert_eq!(
            store.list_names(actor).await.expect("names"),
            vec!["bravo", "charlie", "delta"]
        );
    }

    #[tokio::test]
    async fn test_failing_store_reports_errors() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let err = store
            .count_all(ActorId::new_v4())
            .await
            .expect_err("store is failing");
        assert!(err.to_string().contains("count_all"));
    }
}
