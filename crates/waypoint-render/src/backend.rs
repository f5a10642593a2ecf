use glam::DVec3;
use waypoint_core::{ActorId, EntityId, ProxyId};

/// Which visual proxy is being spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    /// Invisible entity riding the viewer; the marker rides it.
    Carrier,
    /// Name-tagged entity showing the waypoint label.
    Marker,
}

/// How two entities are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Passenger,
    Rider,
}

/// Parent/child link between two entities in one viewer's client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityLink {
    pub parent: EntityId,
    pub child: EntityId,
    pub kind: LinkKind,
    pub immediate: bool,
    pub ride_flag: bool,
    pub offset: f32,
}

impl EntityLink {
    pub fn new(parent: EntityId, child: EntityId, kind: LinkKind) -> Self {
        Self {
            parent,
            child,
            kind,
            immediate: true,
            ride_flag: false,
            offset: 0.0,
        }
    }
}

/// Metadata properties the engine sets on its proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Invisible,
    Immobile,
    BoundingBoxWidth,
    BoundingBoxHeight,
    RiderRotationLocked,
    Scale,
    AlwaysShowNametag,
    /// Marker carries no visible block.
    BlockHidden,
    RiderSeatPosition,
    Nametag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Flag(bool),
    Byte(u8),
    Float(f32),
    Vec3(DVec3),
    String(String),
}

pub type Metadata = Vec<(MetadataKey, MetadataValue)>;

/// Entity attribute sent with a spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: String,
    pub min: f32,
    pub max: f32,
    pub value: f32,
    pub default: f32,
}

/// Everything needed to make a proxy appear in one viewer's client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxySpawn {
    pub proxy: ProxyId,
    pub kind: ProxyKind,
    pub position: DVec3,
    pub velocity: DVec3,
    pub metadata: Metadata,
    pub attributes: Vec<Attribute>,
    pub links: Vec<EntityLink>,
}

/// Low-level visual proxy protocol. Each call targets a single viewer and
/// never touches the shared world, so proxies stay invisible to everyone
/// else and to world entity queries.
pub trait RenderBackend: Send + Sync {
    fn spawn(&self, viewer: ActorId, spawn: ProxySpawn);

    fn despawn(&self, viewer: ActorId, proxy: ProxyId);

    fn set_metadata(&self, viewer: ActorId, proxy: ProxyId, metadata: Metadata);

    fn send_link(&self, viewer: ActorId, link: EntityLink);
}
