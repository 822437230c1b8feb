#![forbid(unsafe_code)]

//! Change subscriptions for the modal store.
//!
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`SubscriptionScope`]: collects subscriptions for a logical owner (a
//!   host, a screen) and releases them together.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. Dropping a [`Subscription`] removes its listener before the next
//!    notification cycle.
//! 3. A notification pass works on a copy of the listener list, so listeners
//!    may subscribe, unsubscribe, or mutate the store while being notified.
//!
//! # Failure Modes
//!
//! - Listener panic: propagates to the caller of the mutation. The store's
//!   snapshot has already been published at that point.
//! - Store dropped while a subscription is alive: the guard becomes inert.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::store::{ModalSnapshot, ModalStore};

/// A store listener.
pub(crate) type Listener<T> = dyn Fn(&T) + Send + Sync;

struct Slots<T: 'static> {
    next_id: u64,
    entries: Vec<(u64, Arc<Listener<T>>)>,
}

/// Ordered list of listeners for values of type `T`.
pub(crate) struct Listeners<T: 'static> {
    slots: Arc<Mutex<Slots<T>>>,
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> Listeners<T> {
    /// Add a listener, returning the guard that removes it.
    pub(crate) fn add(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<Slots<T>>> = Arc::downgrade(&self.slots);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(slots) = weak.upgrade() {
                    let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
                    slots.entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Call every current listener with `value`, in registration order.
    pub(crate) fn notify(&self, value: &T) {
        let current: Vec<Arc<Listener<T>>> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in current {
            listener(value);
        }
    }

    /// Number of registered listeners.
    pub(crate) fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entries.len()
    }
}

/// Guard for a registered store listener.
///
/// The listener stays registered until the guard is dropped or
/// [`unsubscribe`](Self::unsubscribe) is called.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Collects subscriptions for one owner.
///
/// When the scope is dropped, all held subscriptions are released.
///
/// # Invariants
///
/// 1. After drop, no listener registered through this scope fires.
/// 2. `clear()` releases everything immediately; the scope stays usable.
#[derive(Default)]
pub struct SubscriptionScope {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive for the lifetime of this scope.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to `store` within this scope.
    pub fn subscribe(
        &mut self,
        store: &ModalStore,
        listener: impl Fn(&Arc<ModalSnapshot>) + Send + Sync + 'static,
    ) -> &mut Self {
        let sub = store.subscribe(listener);
        self.subscriptions.push(sub);
        self
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every held subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("len", &self.subscriptions.len())
            .finish()
    }
}
