//! Listener registry with snapshot dispatch.
//!
//! Handlers run synchronously on the emitting thread. The registry lock is
//! released before any handler runs, so a handler may subscribe or unsubscribe
//! (itself or others) while an event is being delivered. Removal takes effect
//! from the next event on; the in-flight event still reaches every handler that
//! was registered when `emit` started.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    handlers: BTreeMap<u64, Handler<E>>,
}

/// Shared set of event handlers. Cloning yields another handle to the same set.
pub struct Listeners<E> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: BTreeMap::new(),
            })),
        }
    }

    /// Register a handler. It receives every event emitted until unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.inner.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.insert(id, Arc::new(handler));
            id
        };

        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().handlers.remove(&id);
                }
            }),
        }
    }

    /// Deliver `event` to every handler registered at call time, in subscription order.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = self.inner.lock().handlers.values().cloned().collect();
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle does not unsubscribe. Clones share the same registration,
/// and `unsubscribe` may be called any number of times.
#[derive(Clone)]
pub struct Subscription {
    cancel: Arc<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
