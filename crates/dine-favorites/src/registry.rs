//! Change listeners.
//!
//! A [`ListenerRegistry`] holds zero-argument callbacks and invokes all of
//! them on [`ListenerRegistry::notify`]. Listeners receive no payload; they
//! read whatever state they care about themselves.
//!
//! # Reentrancy
//!
//! The listener set is copied before invocation and the registry lock is
//! released while listeners run, so a listener may subscribe or unsubscribe
//! (itself included) during a notification. Changes take effect from the
//! next notification.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: FxHashMap<u64, Listener>,
}

/// A set of change listeners.
///
/// Cloning yields another handle to the same set.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use dine_favorites::ListenerRegistry;
///
/// let registry = ListenerRegistry::new();
/// let calls = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&calls);
/// let mut subscription = registry.subscribe(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// registry.notify();
/// subscription.unsubscribe();
/// registry.notify();
///
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and returns the handle that removes it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut listeners = self.inner.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Arc::new(listener));
        tracing::trace!(id, total = listeners.entries.len(), "Listener subscribed");

        Subscription {
            id,
            registry: Some(Arc::downgrade(&self.inner)),
        }
    }

    /// Invokes every registered listener once, in no particular order.
    ///
    /// A panicking listener is logged and skipped; the others still run.
    pub fn notify(&self) {
        let snapshot: Vec<(u64, Listener)> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        for (id, listener) in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(&*listener)) {
                tracing::error!(
                    listener = id,
                    panic = panic_message(payload.as_ref()),
                    "Favorites listener panicked"
                );
            }
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes the listener.
#[must_use = "dropping a Subscription unsubscribes its listener immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Option<Weak<Mutex<Listeners>>>,
}

impl Subscription {
    /// Removes the listener. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        let mut listeners = registry.lock();
        listeners.entries.remove(&self.id);
        tracing::trace!(
            id = self.id,
            total = listeners.entries.len(),
            "Listener unsubscribed"
        );
    }

    /// Returns `true` while the listener is registered: until
    /// [`Subscription::unsubscribe`] is called or the registry is dropped.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|registry| registry.strong_count() > 0)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&calls);
        (calls, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_invokes_every_listener_once() {
        let registry = ListenerRegistry::new();
        let (a, listener_a) = counter();
        let (b, listener_b) = counter();
        let _sub_a = registry.subscribe(listener_a);
        let _sub_b = registry.subscribe(listener_b);

        registry.notify();

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = ListenerRegistry::new();
        let (calls, listener) = counter();
        let mut subscription = registry.subscribe(listener);

        subscription.unsubscribe();
        subscription.unsubscribe();
        registry.notify();

        assert!(!subscription.is_active());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = ListenerRegistry::new();
        let (calls, listener) = counter();
        drop(registry.subscribe(listener));

        registry.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscription_outlives_registry() {
        let registry = ListenerRegistry::new();
        let (_calls, listener) = counter();
        let mut subscription = registry.subscribe(listener);
        assert!(subscription.is_active());
        drop(registry);
        assert!(!subscription.is_active());

        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }

    #[test]
    #[allow(clippy::panic)]
    fn test_panicking_listener_is_isolated() {
        let registry = ListenerRegistry::new();
        let _bad = registry.subscribe(|| panic!("listener failure"));
        let (calls, listener) = counter();
        let _good = registry.subscribe(listener);

        registry.notify();
        registry.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_subscribe_during_notify() {
        let registry = ListenerRegistry::new();
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::default();
        let (late_calls, late) = counter();
        let late = Arc::new(late);

        let handle = registry.clone();
        let sink = Arc::clone(&added);
        let _sub = registry.subscribe(move || {
            let late = Arc::clone(&late);
            sink.lock().push(handle.subscribe(move || late()));
        });

        registry.notify();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 2);

        added.lock().clear();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself_during_notify() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let own: Arc<Mutex<Option<Subscription>>> = Arc::default();

        let count = Arc::clone(&calls);
        let slot = Arc::clone(&own);
        let subscription = registry.subscribe(move || {
            count.fetch_add(1, Ordering::SeqCst);
            drop(slot.lock().take());
        });
        *own.lock() = Some(subscription);
        let (other_calls, other) = counter();
        let _other = registry.subscribe(other);

        registry.notify();
        registry.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(other_calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "<non-string panic payload>");
    }
}
