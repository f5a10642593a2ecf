pub mod backend;
pub mod proxy;
pub mod renderer;
pub mod test_harness;

pub use backend::{
    Attribute, EntityLink, LinkKind, Metadata, MetadataKey, MetadataValue, ProxyKind, ProxySpawn,
    RenderBackend,
};
pub use proxy::ProxyIdAllocator;
pub use renderer::{DestroyHook, RendererInstance, UpdaterState};
