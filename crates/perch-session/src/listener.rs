//! Connection state observers and their registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::ConnectionState;

/// Observer of connection state transitions.
///
/// Callbacks run on the manager's dispatch worker and receive every accepted
/// transition in acceptance order. They must not block for long; a panic in
/// one listener is isolated and does not affect the others.
pub trait ConnectionStateListener: Send + Sync {
    /// Called for every accepted state transition.
    fn state_changed(&self, new_state: ConnectionState);
}

impl<F> ConnectionStateListener for F
where
    F: Fn(ConnectionState) + Send + Sync,
{
    fn state_changed(&self, new_state: ConnectionState) {
        self(new_state);
    }
}

/// Identity of a registered listener, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Thread-safe set of registered listeners.
///
/// Mutations may happen concurrently with dispatch; dispatch iterates over a
/// snapshot, so a listener added or removed mid-dispatch never tears the
/// iteration. A listener added after a transition was accepted is not
/// guaranteed to see that transition.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ListenerId, Arc<dyn ConnectionStateListener>)>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&self, listener: Arc<dyn ConnectionStateListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, listener));
        id
    }

    /// Remove a listener. Removing an unknown or already removed id is a
    /// no-op.
    pub(crate) fn remove(&self, id: ListenerId) {
        self.entries.write().retain(|(entry_id, _)| *entry_id != id);
    }

    /// Stable snapshot of the registered listeners, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn ConnectionStateListener>> {
        self.entries
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
