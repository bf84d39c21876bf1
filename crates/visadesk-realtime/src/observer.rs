//! Typed observer registry with RAII unsubscribe handles.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// A set of listeners notified synchronously with every published value.
pub struct ListenerRegistry<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> ListenerRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(inner: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
        inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = Self::lock(&self.inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Self::lock(&inner).listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Call every registered listener with `value`, in registration order.
    ///
    /// Listeners are called outside the registry lock, so a listener may
    /// subscribe or unsubscribe while being notified.
    pub fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = Self::lock(&self.inner)
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        Self::lock(&self.inner).listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .inner
            .lock()
            .map(|r| r.listeners.len())
            .unwrap_or_default();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &count)
            .finish()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes the listener, so it must be stored for
/// as long as the listener should stay active.
#[must_use = "dropping a Subscription unsubscribes its listener immediately"]
pub struct Subscription {
    id: u64,
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Unsubscribe the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Identifier of the listener within its registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    fn release(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_all_listeners_notified() {
        let registry = ListenerRegistry::<u32>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h1 = hits.clone();
        let _s1 = registry.subscribe(move |v| {
            h1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let h2 = hits.clone();
        let _s2 = registry.subscribe(move |v| {
            h2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        registry.notify(&5);
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unsubscribe_and_drop_remove_listener() {
        let registry = ListenerRegistry::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let sub = registry.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        registry.notify(&());
        sub.unsubscribe();
        registry.notify(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        {
            let _scoped = registry.subscribe(|_| {});
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscription_outlives_registry() {
        let registry = ListenerRegistry::<()>::new();
        let sub = registry.subscribe(|_| {});
        drop(registry);
        sub.unsubscribe();
    }
}
