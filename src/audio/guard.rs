use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

/// Wake-lock-equivalent keeping the host awake while a session is active.
pub trait WakeLock: Send + Sync {
    fn acquire(&self);
    fn release(&self);
    fn is_held(&self) -> bool;
}

/// Registration for "output route became unusable" notifications
/// (e.g. headphones unplugged).
pub trait RouteWatch: Send + Sync {
    fn register(&self);
    fn deregister(&self);
}

/// Process-local wake lock with observable acquire/release counters.
/// Environments with a real power-management handle supply their own
/// `WakeLock` instead.
#[derive(Default)]
pub struct SoftWakeLock {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl SoftWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Relaxed)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }
}

impl WakeLock for SoftWakeLock {
    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    fn is_held(&self) -> bool {
        self.acquired.load(Ordering::Relaxed) > self.released.load(Ordering::Relaxed)
    }
}

/// Route-watch registration with observable counters, for the same purpose.
#[derive(Default)]
pub struct RouteSubscription {
    registered: AtomicUsize,
    deregistered: AtomicUsize,
}

impl RouteSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::Relaxed)
    }

    pub fn deregistered(&self) -> usize {
        self.deregistered.load(Ordering::Relaxed)
    }

    pub fn is_registered(&self) -> bool {
        self.registered() > self.deregistered()
    }
}

impl RouteWatch for RouteSubscription {
    fn register(&self) {
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    fn deregister(&self) {
        self.deregistered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Owns the session-lifetime resources: one wake-lock hold and one
/// route-watch registration. Acquire and release are idempotent, and
/// release also runs on drop so no exit path leaks a holding.
pub struct SessionGuard {
    wake_lock: Arc<dyn WakeLock>,
    route_watch: Arc<dyn RouteWatch>,
    active: bool,
}

impl SessionGuard {
    pub fn new(wake_lock: Arc<dyn WakeLock>, route_watch: Arc<dyn RouteWatch>) -> Self {
        Self {
            wake_lock,
            route_watch,
            active: false,
        }
    }

    pub fn acquire(&mut self) {
        if self.active {
            return;
        }
        self.wake_lock.acquire();
        self.route_watch.register();
        self.active = true;
        debug!("session_resources_acquired");
    }

    pub fn release(&mut self) {
        if !self.active {
            return;
        }
        if self.wake_lock.is_held() {
            self.wake_lock.release();
        }
        self.route_watch.deregister();
        self.active = false;
        debug!("session_resources_released");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> (SessionGuard, Arc<SoftWakeLock>, Arc<RouteSubscription>) {
        let wake_lock = Arc::new(SoftWakeLock::new());
        let route_watch = Arc::new(RouteSubscription::new());
        let guard = SessionGuard::new(wake_lock.clone(), route_watch.clone());
        (guard, wake_lock, route_watch)
    }

    #[test]
    fn acquire_and_release_are_idempotent() {
        let (mut guard, wake_lock, route_watch) = guard();

        guard.acquire();
        guard.acquire();
        assert!(guard.is_active());
        assert_eq!(wake_lock.acquired(), 1);
        assert_eq!(route_watch.registered(), 1);

        guard.release();
        guard.release();
        assert!(!guard.is_active());
        assert_eq!(wake_lock.released(), 1);
        assert_eq!(route_watch.deregistered(), 1);
        assert!(!wake_lock.is_held());
    }

    #[test]
    fn drop_releases_holdings() {
        let (mut guard, wake_lock, route_watch) = guard();
        guard.acquire();
        drop(guard);
        assert!(!wake_lock.is_held());
        assert!(!route_watch.is_registered());
    }

    #[test]
    fn drop_without_acquire_releases_nothing() {
        let (guard, wake_lock, route_watch) = guard();
        drop(guard);
        assert_eq!(wake_lock.released(), 0);
        assert_eq!(route_watch.deregistered(), 0);
    }
}
