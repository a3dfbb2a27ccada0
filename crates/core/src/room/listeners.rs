use std::fmt;
use std::sync::Arc;

use super::state::RoomEvent;

pub type RoomListener = Arc<dyn Fn(&RoomEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Registry of room change subscribers, invoked in registration order.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(ListenerId, RoomListener)>,
    next_id: u64,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Arc::new(listener)));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Clones the current subscribers so they can be called after the
    /// registry lock is released. A listener may then add or remove listeners
    /// without deadlocking; changes apply from the next event.
    pub fn snapshot(&self) -> Vec<RoomListener> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn emit(&self, event: &RoomEvent) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_and_remove() {
        let mut listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = listeners.add(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        listeners.emit(&RoomEvent::Reset);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));

        listeners.emit(&RoomEvent::Reset);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut listeners = Listeners::new();
        let first = listeners.add(|_| {});
        listeners.remove(first);
        let second = listeners.add(|_| {});

        assert_ne!(first, second);
    }

    #[test]
    fn test_snapshot_outlives_registry_changes() {
        let registry = Arc::new(Mutex::new(Listeners::new()));
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&registry);
        let log = Arc::clone(&order);
        registry.lock().unwrap().add(move |_| {
            log.lock().unwrap().push("first");
            let log = Arc::clone(&log);
            // registering from inside a callback must not block
            inner
                .lock()
                .unwrap()
                .add(move |_| log.lock().unwrap().push("late"));
        });

        let snapshot = registry.lock().unwrap().snapshot();
        for listener in &snapshot {
            listener(&RoomEvent::Reset);
        }

        assert_eq!(*order.lock().unwrap(), vec!["first"]);
        assert_eq!(registry.lock().unwrap().len(), 2);
    }
}
