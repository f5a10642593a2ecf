use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use waypoint_core::ActorId;

/// Actors with a command in flight. Membership is the only per-actor
/// mutual exclusion in the engine.
#[derive(Debug, Default)]
pub struct OperationLocks {
    held: Mutex<HashSet<ActorId>>,
    released: Notify,
}

impl OperationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `actor`, or `None` if a command is already running.
    pub fn try_acquire(self: &Arc<Self>, actor: ActorId) -> Option<OperationGuard> {
        if !self.held.lock().insert(actor) {
            return None;
        }
        Some(OperationGuard {
            locks: Arc::clone(self),
            actor,
        })
    }

    /// Take the lock for `actor`, waiting for a running command to finish.
    pub async fn acquire(self: &Arc<Self>, actor: ActorId) -> OperationGuard {
        loop {
            let mut released = std::pin::pin!(self.released.notified());
            released.as_mut().enable();
            if let Some(guard) = self.try_acquire(actor) {
                return guard;
            }
            released.await;
        }
    }

    pub fn is_held(&self, actor: ActorId) -> bool {
        self.held.lock().contains(&actor)
    }
}

/// Releases the actor's lock when dropped, on every exit path.
#[derive(Debug)]
pub struct OperationGuard {
    locks: Arc<OperationLocks>,
    actor: ActorId,
}

impl OperationGuard {
    pub fn actor(&self) -> ActorId {
        self.actor
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.locks.held.lock().remove(&self.actor);
        self.locks.released.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let locks = Arc::new(OperationLocks::new());
        let actor = ActorId::new_v4();
        let guard = locks.try_acquire(actor).expect("free");
        assert!(locks.try_acquire(actor).is_none());
        assert!(locks.is_held(actor));
        drop(guard);
        assert!(!locks.is_held(actor));
        assert!(locks.try_acquire(actor).is_some());
    }

    #[test]
    fn test_actors_lock_independently() {
        let locks = Arc::new(OperationLocks::new());
        let a = locks.try_acquire(ActorId::new_v4()).expect("a");
        let b = locks.try_acquire(ActorId::new_v4()).expect("b");
        assert_ne!(a.actor(), b.actor());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let locks = Arc::new(OperationLocks::new());
        let actor = ActorId::new_v4();
        let held = locks.try_acquire(actor).expect("free");

        let waiter = locks.acquire(actor);
        let releaser = async {
            tokio::task::yield_now().await;
            assert!(locks.is_held(actor));
            drop(held);
        };
        let (guard, ()) = tokio::join!(waiter, releaser);
        assert_eq!(guard.actor(), actor);
        assert!(locks.is_held(actor));
        drop(guard);
        assert!(!locks.is_held(actor));
    }

    #[test]
    fn test_released_on_panic() {
        let locks = Arc::new(OperationLocks::new());
        let actor = ActorId::new_v4();
        let inner = locks.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = inner.try_acquire(actor).expect("free");
            panic!("command failed");
        }));
        assert!(result.is_err());
        assert!(!locks.is_held(actor));
    }
}
