use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::RwLock;

use crate::tenant::TenantConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Listener signature.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Emitted by the tenant session.
#[derive(Debug, Clone)]
pub enum TenantEvent {
    Initialized(Arc<TenantConfig>),
    Switched {
        previous: Option<Arc<TenantConfig>>,
        current: Arc<TenantConfig>,
    },
}

impl TenantEvent {
    /// The tenant that is current after this event.
    pub fn current(&self) -> &Arc<TenantConfig> {
        match self {
            TenantEvent::Initialized(cfg) => cfg,
            TenantEvent::Switched { current, .. } => current,
        }
    }
}

struct ListenerEntry<E> {
    id: ListenerId,
    listener: Listener<E>,
    once: bool,
}

impl<E> Clone for ListenerEntry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            once: self.once,
        }
    }
}

/// Minimal change-notification hub.
///
/// Emission never holds the lock while a listener runs:
/// 1) snapshot matching listeners (read lock)
/// 2) call listeners (no lock)
/// 3) drop `once` listeners (write lock)
///
/// so a listener may itself subscribe, unsubscribe or read session state.
pub struct EventHub<E> {
    listeners: RwLock<Vec<ListenerEntry<E>>>,
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn on(&self, listener: Listener<E>) -> ListenerId {
        self.push(listener, false)
    }

    pub fn once(&self, listener: Listener<E>) -> ListenerId {
        self.push(listener, true)
    }

    fn push(&self, listener: Listener<E>, once: bool) -> ListenerId {
        let id = next_listener_id();
        self.listeners.write().push(ListenerEntry { id, listener, once });
        id
    }

    /// removeListener/off
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|e| e.id != id);
        before != listeners.len()
    }

    pub fn remove_all(&self) -> usize {
        let mut listeners = self.listeners.write();
        let n = listeners.len();
        listeners.clear();
        n
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<ListenerEntry<E>> = self.listeners.read().clone();

        for entry in &snapshot {
            (entry.listener)(event);
        }

        let once_ids: Vec<ListenerId> = snapshot
            .iter()
            .filter(|e| e.once)
            .map(|e| e.id)
            .collect();
        if !once_ids.is_empty() {
            self.listeners.write().retain(|e| !once_ids.contains(&e.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn once_listeners_fire_a_single_time() {
        let hub: EventHub<u32> = EventHub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        hub.once(Arc::new(move |_: &u32| {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        hub.emit(&1);
        hub.emit(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn off_removes_listener() {
        let hub: EventHub<u32> = EventHub::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&seen);
        let id = hub.on(Arc::new(move |v: &u32| {
            s.fetch_add(*v as usize, Ordering::SeqCst);
        }));

        hub.emit(&3);
        assert!(hub.off(id));
        assert!(!hub.off(id));
        hub.emit(&4);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let hub: Arc<EventHub<u32>> = Arc::new(EventHub::new());
        let inner = Arc::clone(&hub);
        hub.once(Arc::new(move |_: &u32| {
            inner.on(Arc::new(|_: &u32| {}));
        }));

        hub.emit(&0);
        assert_eq!(hub.listener_count(), 1);
    }
}
