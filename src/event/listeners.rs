//! Listener registries
//!
//! A registry keeps its listeners in registration order and guarantees each
//! one is invoked at most once per `invoke` call. Listeners may register or
//! unregister listeners — including themselves — from inside their own
//! callback; such modifications are parked and applied after the running
//! invocation finishes, so the in-flight iteration is never corrupted.

use std::sync::Arc;

use parking_lot::Mutex;

/// Identifies one registration within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observer of the per-frame update, called with the elapsed seconds of the
/// frame being processed.
pub trait FrameUpdateListener {
    fn on_frame_update(&mut self, delta_seconds: f32);
}

impl<F: FnMut(f32)> FrameUpdateListener for F {
    fn on_frame_update(&mut self, delta_seconds: f32) {
        self(delta_seconds)
    }
}

/// Registry of frame-update listeners. The loop keeps one global instance;
/// every scene keeps its own.
pub type FrameListeners = EventListeners<dyn FrameUpdateListener + Send>;

struct Entry<L: ?Sized> {
    id: ListenerId,
    listener: Arc<Mutex<L>>,
}

enum Pending<L: ?Sized> {
    Add(Entry<L>),
    Remove(ListenerId),
}

struct Inner<L: ?Sized> {
    entries: Vec<Entry<L>>,
    pending: Vec<Pending<L>>,
    iterating: bool,
    next_id: u64,
}

pub struct EventListeners<L: ?Sized> {
    inner: Mutex<Inner<L>>,
}

impl<L: ?Sized> Default for EventListeners<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> EventListeners<L> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                pending: Vec::new(),
                iterating: false,
                next_id: 1,
            }),
        }
    }

    pub fn add(&self, listener: Arc<Mutex<L>>) -> ListenerId {
        self.add_with(|_| listener)
    }

    /// Registers a listener that needs to know its own id before it exists,
    /// e.g. a task that unregisters itself when it expires.
    pub fn add_with(&self, make: impl FnOnce(ListenerId) -> Arc<Mutex<L>>) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        let entry = Entry {
            id,
            listener: make(id),
        };
        if inner.iterating {
            inner.pending.push(Pending::Add(entry));
        } else {
            inner.entries.push(entry);
        }
        id
    }

    pub fn remove(&self, id: ListenerId) {
        let mut inner = self.inner.lock();
        if inner.iterating {
            inner.pending.push(Pending::Remove(id));
        } else {
            inner.entries.retain(|e| e.id != id);
        }
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        let inner = self.inner.lock();
        inner.entries.iter().any(|e| e.id == id)
            || inner.pending.iter().any(|p| matches!(p, Pending::Add(e) if e.id == id))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if inner.iterating {
            let ids: Vec<_> = inner.entries.iter().map(|e| e.id).collect();
            inner.pending.extend(ids.into_iter().map(Pending::Remove));
        } else {
            inner.entries.clear();
        }
    }

    /// Calls `f` once for every listener registered at entry, in registration
    /// order. The registry lock is released during the callbacks, so
    /// listeners can use the registry; a listener invoking the same registry
    /// again is refused and logged.
    pub fn invoke(&self, mut f: impl FnMut(&mut L)) {
        let snapshot: Vec<Arc<Mutex<L>>> = {
            let mut inner = self.inner.lock();
            if inner.iterating {
                log::error!("recursive listener invocation refused");
                return;
            }
            inner.iterating = true;
            inner.entries.iter().map(|e| Arc::clone(&e.listener)).collect()
        };
        for listener in snapshot {
            f(&mut *listener.lock());
        }
        let mut inner = self.inner.lock();
        inner.iterating = false;
        let pending = std::mem::take(&mut inner.pending);
        for op in pending {
            match op {
                Pending::Add(entry) => inner.entries.push(entry),
                Pending::Remove(id) => inner.entries.retain(|e| e.id != id),
            }
        }
    }
}

impl EventListeners<dyn FrameUpdateListener + Send> {
    /// Registers a plain closure as a frame-update listener.
    pub fn add_fn(&self, f: impl FnMut(f32) + Send + 'static) -> ListenerId {
        self.add(Arc::new(Mutex::new(f)))
    }

    pub fn invoke_frame_update(&self, delta_seconds: f32) {
        self.invoke(|listener| listener.on_frame_update(delta_seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_run_in_registration_order() {
        let registry = FrameListeners::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            registry.add_fn(move |_| order.lock().push(tag));
        }
        registry.invoke_frame_update(0.016);
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn self_removal_mid_invocation_is_safe() {
        let registry = Arc::new(FrameListeners::new());
        let calls = Arc::new(Mutex::new(0u32));

        let registry_ref = Arc::clone(&registry);
        let calls_ref = Arc::clone(&calls);
        let id_cell = Arc::new(Mutex::new(None));
        let id_cell_ref = Arc::clone(&id_cell);
        let id = registry.add_fn(move |_| {
            *calls_ref.lock() += 1;
            if let Some(own_id) = *id_cell_ref.lock() {
                registry_ref.remove(own_id);
            }
        });
        *id_cell.lock() = Some(id);

        // A later listener still runs in the same pass.
        let calls_ref = Arc::clone(&calls);
        registry.add_fn(move |_| *calls_ref.lock() += 10);

        registry.invoke_frame_update(0.016);
        assert_eq!(*calls.lock(), 11);

        // The removed listener is gone on the next pass.
        registry.invoke_frame_update(0.016);
        assert_eq!(*calls.lock(), 21);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn add_during_invocation_takes_effect_next_pass() {
        let registry = Arc::new(FrameListeners::new());
        let count = Arc::new(Mutex::new(0u32));

        let registry_ref = Arc::clone(&registry);
        let count_ref = Arc::clone(&count);
        registry.add_fn(move |_| {
            let inner_count = Arc::clone(&count_ref);
            registry_ref.add_fn(move |_| *inner_count.lock() += 1);
        });

        registry.invoke_frame_update(0.016);
        assert_eq!(*count.lock(), 0, "listener added mid-pass must not run this pass");
        registry.invoke_frame_update(0.016);
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn remove_outside_invocation_is_immediate() {
        let registry = FrameListeners::new();
        let id = registry.add_fn(|_| {});
        assert!(registry.contains(id));
        registry.remove(id);
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }
}
