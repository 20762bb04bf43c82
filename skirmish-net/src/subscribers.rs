//! Ordered registry of inbound-message subscribers.
//!
//! Entries are keyed by a monotonically increasing token, so key order is
//! registration order. Dispatch never holds the lock while a callback runs:
//! a callback may subscribe or unsubscribe (itself or others) freely.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::protocol::InboundMessage;

/// Callback invoked for every inbound frame.
pub type Subscriber = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Handle returned by [`SubscriberRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberToken(u64);

#[derive(Default)]
struct Slots {
    next: u64,
    entries: BTreeMap<u64, Subscriber>,
}

/// Shared, cloneable subscriber registry.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It runs after all earlier registrations.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberToken
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock();
        let key = slots.next;
        slots.next += 1;
        slots.entries.insert(key, Arc::new(callback));
        SubscriberToken(key)
    }

    /// Remove a callback. Returns false if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriberToken) -> bool {
        self.slots.lock().entries.remove(&token.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().entries.is_empty()
    }

    /// Invoke every subscriber in registration order.
    ///
    /// Subscribers registered during this call are not invoked; subscribers
    /// removed during this call are skipped if they have not run yet.
    /// Returns the number of callbacks invoked.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let keys: Vec<u64> = self.slots.lock().entries.keys().copied().collect();
        let mut invoked = 0;
        for key in keys {
            let callback = self.slots.lock().entries.get(&key).cloned();
            if let Some(callback) = callback {
                callback(message);
                invoked += 1;
            }
        }
        invoked
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("len", &self.len())
            .finish()
    }
}
