//! In-process collaborators for exercising the service without a host
//! server: a scriptable actor directory, a scripted preference prompt and a
//! listener that records events.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glam::DVec3;
use parking_lot::Mutex;
use tokio::sync::Notify;
use waypoint_core::{
    ActorId, ActorSnapshot, EntityId, ExternalError, LimitEvaluator, Position, Preferences,
    ValidationError, Waypoint, WaypointConfig, WorldId,
};
use waypoint_render::test_harness::RecordingBackend;
use waypoint_render::RendererInstance;

use crate::host::{ActorDirectory, PreferenceInput, PreferencePrompt};
use crate::listener::WaypointListener;
use crate::memory_store::MemoryStore;
use crate::service::WaypointService;
use crate::store::WaypointStore;

pub const DEFAULT_EYE_HEIGHT: f64 = 1.62;

/// Actor directory backed by a map the test drives directly.
#[derive(Debug, Default)]
pub struct TestActors {
    online: Mutex<HashMap<ActorId, ActorSnapshot>>,
    rotations: Mutex<Vec<(ActorId, f64, f64)>>,
    next_entity: AtomicU64,
}

impl TestActors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring a new actor online at `position`.
    pub fn join(&self, position: Position) -> ActorId {
        let actor = ActorId::new_v4();
        let entity = EntityId(self.next_entity.fetch_add(1, Ordering::SeqCst) + 1);
        self.online.lock().insert(
            actor,
            ActorSnapshot {
                actor,
                entity,
                position,
                eye_height: DEFAULT_EYE_HEIGHT,
            },
        );
        actor
    }

    /// Move an online actor. Returns the previous position.
    pub fn move_to(&self, actor: ActorId, position: Position) -> Option<Position> {
        let mut online = self.online.lock();
        let snapshot = online.get_mut(&actor)?;
        Some(std::mem::replace(&mut snapshot.position, position))
    }

    pub fn disconnect(&self, actor: ActorId) {
        self.online.lock().remove(&actor);
    }

    pub fn rotations(&self) -> Vec<(ActorId, f64, f64)> {
        self.rotations.lock().clone()
    }
}

impl ActorDirectory for TestActors {
    fn snapshot(&self, actor: ActorId) -> Option<ActorSnapshot> {
        self.online.lock().get(&actor).cloned()
    }

    fn set_rotation(&self, actor: ActorId, yaw: f64, pitch: f64) {
        self.rotations.lock().push((actor, yaw, pitch));
    }
}

/// Prompt that replays queued answers. An empty queue means the form was
/// closed.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    responses: Mutex<VecDeque<Option<PreferenceInput>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    requests: AtomicUsize,
    rejections: Mutex<Vec<(ActorId, ValidationError)>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Option<PreferenceInput>) {
        self.responses.lock().push_back(response);
    }

    /// Queue a submission of the default preferences.
    pub fn accept_defaults(&self) {
        let defaults = Preferences::default();
        self.push_response(Some(PreferenceInput {
            display_format: defaults.display_format,
            distance: defaults.distance,
        }));
    }

    pub fn decline(&self) {
        self.push_response(None);
    }

    /// Hold every request until `gate` is notified.
    pub fn set_gate(&self, gate: Arc<Notify>) {
        *self.gate.lock() = Some(gate);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn rejections(&self) -> Vec<(ActorId, ValidationError)> {
        self.rejections.lock().clone()
    }
}

#[async_trait]
impl PreferencePrompt for ScriptedPrompt {
    async fn request(&self, _actor: ActorId, _current: &Preferences) -> Option<PreferenceInput> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses.lock().pop_front().flatten()
    }

    fn rejected(&self, actor: ActorId, reason: &ValidationError) {
        self.rejections.lock().push((actor, reason.clone()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Created(ActorId, String),
    Deleted(ActorId, String),
    /// Viewer and rendered title.
    Render(ActorId, String),
    Derender(ActorId, String),
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }
}

impl WaypointListener for RecordingListener {
    fn on_waypoint_created(&self, actor: ActorId, name: &str, _waypoint: &Waypoint) {
        self.events
            .lock()
            .push(ListenerEvent::Created(actor, name.to_string()));
    }

    fn on_waypoint_deleted(&self, actor: ActorId, name: &str) {
        self.events
            .lock()
            .push(ListenerEvent::Deleted(actor, name.to_string()));
    }

    fn on_render(&self, renderer: &RendererInstance) {
        self.events.lock().push(ListenerEvent::Render(
            renderer.viewer,
            renderer.waypoint.title.clone(),
        ));
    }

    fn on_derender(&self, renderer: &RendererInstance) {
        self.events.lock().push(ListenerEvent::Derender(
            renderer.viewer,
            renderer.waypoint.title.clone(),
        ));
    }
}

/// A service wired to in-memory collaborators, with handles to each.
pub struct TestHarness {
    pub service: WaypointService,
    pub store: Arc<MemoryStore>,
    pub backend: Arc<RecordingBackend>,
    pub actors: Arc<TestActors>,
    pub prompt: Arc<ScriptedPrompt>,
    pub events: Arc<RecordingListener>,
    pub world: WorldId,
}

impl TestHarness {
    /// Default limits with no join delay.
    pub fn new() -> Self {
        Self::build(Self::test_config(), None)
    }

    pub fn with_config(config: WaypointConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_limits(limits: Arc<dyn LimitEvaluator>) -> Self {
        Self::build(Self::test_config(), Some(limits))
    }

    fn test_config() -> WaypointConfig {
        WaypointConfig {
            join_settle: Duration::ZERO,
            ..WaypointConfig::default()
        }
    }

    fn build(config: WaypointConfig, limits: Option<Arc<dyn LimitEvaluator>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(RecordingBackend::new());
        let actors = Arc::new(TestActors::new());
        let prompt = Arc::new(ScriptedPrompt::new());
        let events = Arc::new(RecordingListener::new());

        let mut builder = WaypointService::builder(
            store.clone(),
            backend.clone(),
            actors.clone(),
            prompt.clone(),
        )
        .config(config)
        .listener(events.clone());
        if let Some(limits) = limits {
            builder = builder.limits(limits);
        }

        Self {
            service: builder.build(),
            store,
            backend,
            actors,
            prompt,
            events,
            world: WorldId::new("overworld"),
        }
    }

    pub fn overworld_at(&self, coords: DVec3) -> Position {
        Position::new(self.world.clone(), coords)
    }

    /// A new actor standing at (0, 64, 0) in the overworld.
    pub fn join_actor(&self) -> ActorId {
        self.actors
            .join(self.overworld_at(DVec3::new(0.0, 64.0, 0.0)))
    }

    /// Store default preferences so commands skip the prompt.
    pub async fn give_preferences(&self, actor: ActorId) -> Result<(), ExternalError> {
        self.store
            .set_preferences(actor, &Preferences::default())
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
