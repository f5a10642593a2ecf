use std::sync::atomic::{AtomicU64, Ordering};

use waypoint_core::ProxyId;

/// Default first id; keeps proxies clear of ids the host hands out.
pub const DEFAULT_PROXY_ID_BASE: u64 = 1 << 48;

/// Hands out proxy ids that are never reused for the process lifetime.
#[derive(Debug)]
pub struct ProxyIdAllocator {
    next: AtomicU64,
}

impl Default for ProxyIdAllocator {
    fn default() -> Self {
        Self::starting_at(DEFAULT_PROXY_ID_BASE)
    }
}

impl ProxyIdAllocator {
    pub fn starting_at(base: u64) -> Self {
        Self {
            next: AtomicU64::new(base),
        }
    }

    pub fn next_id(&self) -> ProxyId {
        ProxyId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
