#![forbid(unsafe_code)]

//! The modal instance store.
//!
//! `ModalStore` holds the insertion-ordered set of live modal instances. Every
//! effective mutation builds a new [`ModalSnapshot`] and swaps it in whole, so
//! a reader holding a snapshot never sees it change.
//!
//! # Invariants
//!
//! - Snapshot order is insertion order; closing an instance keeps the relative
//!   order of the rest.
//! - `version` increments exactly once per effective mutation.
//! - Listeners are notified once per effective mutation, after the new
//!   snapshot is published. No-op mutations notify nobody.
//! - Instance ids are unique within a snapshot. Reusing an id is governed by
//!   [`CollisionPolicy`].
//!
//! # Failure Modes
//!
//! - `close_modal()` for an absent id is a no-op (no panic, no notification).
//! - `clear()` on an empty store is a no-op.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modalkit_core::{ModalComponent, ModalId, ModalStore};
//!
//! struct Confirm;
//! impl ModalComponent for Confirm {}
//!
//! let store = ModalStore::new();
//! let confirm: Arc<dyn ModalComponent> = Arc::new(Confirm);
//!
//! let before = store.snapshot();
//! let id = ModalId::generate();
//! store.open_modal(id.clone(), &confirm, None);
//! assert_eq!(store.len(), 1);
//! assert!(before.is_empty());
//!
//! store.close_modal(&id);
//! assert!(store.is_empty());
//! ```

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::component::ModalComponent;
use crate::config::{CollisionPolicy, StoreConfig};
use crate::id::{ComponentId, ModalId};
use crate::props::Props;
use crate::registry::ComponentRegistry;
use crate::subscription::{Listeners, Subscription};

static GLOBAL_STORE: LazyLock<ModalStore> = LazyLock::new(|| {
    ModalStore::with_registry(ComponentRegistry::global(), StoreConfig::default())
});

/// One opened modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalInstance {
    /// Unique instance id.
    pub id: ModalId,
    /// Registered component this instance renders.
    pub component_id: ComponentId,
    /// Caller-supplied props, if any.
    pub props: Option<Props>,
}

impl ModalInstance {
    /// Build an instance record.
    pub fn new(id: ModalId, component_id: ComponentId, props: Option<Props>) -> Self {
        Self {
            id,
            component_id,
            props,
        }
    }
}

/// Immutable point-in-time view of the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalSnapshot {
    version: u64,
    instances: IndexMap<ModalId, ModalInstance>,
}

impl ModalSnapshot {
    /// Mutation counter of the store when this snapshot was published.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of live instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is open.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Look up an instance by id.
    pub fn get(&self, id: &ModalId) -> Option<&ModalInstance> {
        self.instances.get(id)
    }

    /// Whether `id` is live in this snapshot.
    pub fn contains(&self, id: &ModalId) -> bool {
        self.instances.contains_key(id)
    }

    /// Instances in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ModalInstance> + '_ {
        self.instances.values()
    }

    /// Instance ids in insertion order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = &ModalId> + '_ {
        self.instances.keys()
    }

    /// Position of `id` in render order.
    pub fn position(&self, id: &ModalId) -> Option<usize> {
        self.instances.get_index_of(id)
    }
}

impl<'a> IntoIterator for &'a ModalSnapshot {
    type Item = &'a ModalInstance;
    type IntoIter = indexmap::map::Values<'a, ModalId, ModalInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.values()
    }
}

struct StoreInner {
    config: StoreConfig,
    registry: Arc<ComponentRegistry>,
    state: ArcSwap<ModalSnapshot>,
    listeners: Listeners<Arc<ModalSnapshot>>,
}

/// Shared handle to a modal instance store.
///
/// Cloning is cheap; clones refer to the same store.
#[derive(Clone)]
pub struct ModalStore {
    inner: Arc<StoreInner>,
}

impl Default for ModalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of an insert attempt, decided inside the swap.
#[derive(Clone, Copy, PartialEq, Eq)]
enum InsertOutcome {
    Inserted,
    Replaced,
    Kept,
}

impl ModalStore {
    /// Create an isolated store with its own registry and default policy.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an isolated store with its own registry.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_registry(Arc::new(ComponentRegistry::new()), config)
    }

    /// Create a store backed by an existing registry.
    pub fn with_registry(registry: Arc<ComponentRegistry>, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                registry,
                state: ArcSwap::from_pointee(ModalSnapshot::default()),
                listeners: Listeners::default(),
            }),
        }
    }

    /// The process-wide store, backed by the process-wide registry.
    pub fn global() -> Self {
        GLOBAL_STORE.clone()
    }

    /// The registry this store resolves component ids against.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.inner.registry
    }

    /// The store's policy.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Whether two handles refer to the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Mutations ---

    /// Register `component` if needed and add an instance for it.
    ///
    /// The caller supplies `id` and is expected to keep it unique; see
    /// [`CollisionPolicy`] for what happens otherwise.
    pub fn open_modal(&self, id: ModalId, component: &Arc<dyn ModalComponent>, props: Option<Props>) {
        let component_id = self.inner.registry.register(component);
        self.insert_instance(ModalInstance::new(id, component_id, props));
    }

    /// Add a prebuilt instance without touching the registry.
    pub fn insert_instance(&self, instance: ModalInstance) {
        let policy = self.inner.config.collision_policy;
        let mut outcome = InsertOutcome::Kept;
        let mut published: Option<Arc<ModalSnapshot>> = None;

        self.inner.state.rcu(|current| {
            let exists = current.instances.contains_key(&instance.id);
            if exists && policy == CollisionPolicy::KeepExisting {
                outcome = InsertOutcome::Kept;
                published = None;
                return Arc::clone(current);
            }
            outcome = if exists {
                InsertOutcome::Replaced
            } else {
                InsertOutcome::Inserted
            };
            let mut instances = current.instances.clone();
            instances.insert(instance.id.clone(), instance.clone());
            let next = Arc::new(ModalSnapshot {
                version: current.version + 1,
                instances,
            });
            published = Some(Arc::clone(&next));
            next
        });

        match outcome {
            InsertOutcome::Inserted => {
                tracing::debug!(
                    modal_id = %instance.id,
                    component_id = %instance.component_id,
                    "opened modal"
                );
            }
            InsertOutcome::Replaced => {
                tracing::warn!(
                    modal_id = %instance.id,
                    policy = ?policy,
                    "modal id already open; replacing existing instance"
                );
            }
            InsertOutcome::Kept => {
                tracing::warn!(
                    modal_id = %instance.id,
                    policy = ?policy,
                    "modal id already open; keeping existing instance"
                );
            }
        }

        if let Some(snapshot) = published {
            self.inner.listeners.notify(&snapshot);
        }
    }

    /// Remove the instance with `id`, if present.
    pub fn close_modal(&self, id: &ModalId) {
        let mut published: Option<Arc<ModalSnapshot>> = None;

        self.inner.state.rcu(|current| {
            if !current.instances.contains_key(id) {
                published = None;
                return Arc::clone(current);
            }
            let mut instances = current.instances.clone();
            instances.shift_remove(id);
            let next = Arc::new(ModalSnapshot {
                version: current.version + 1,
                instances,
            });
            published = Some(Arc::clone(&next));
            next
        });

        match published {
            Some(snapshot) => {
                tracing::debug!(modal_id = %id, remaining = snapshot.len(), "closed modal");
                self.inner.listeners.notify(&snapshot);
            }
            None => tracing::trace!(modal_id = %id, "close for modal that is not open"),
        }
    }

    /// Remove every instance, whoever opened it.
    pub fn clear(&self) {
        let mut published: Option<Arc<ModalSnapshot>> = None;

        self.inner.state.rcu(|current| {
            if current.instances.is_empty() {
                published = None;
                return Arc::clone(current);
            }
            let next = Arc::new(ModalSnapshot {
                version: current.version + 1,
                instances: IndexMap::new(),
            });
            published = Some(Arc::clone(&next));
            next
        });

        if let Some(snapshot) = published {
            tracing::debug!(version = snapshot.version(), "cleared all modals");
            self.inner.listeners.notify(&snapshot);
        }
    }

    // --- Reads ---

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<ModalSnapshot> {
        self.inner.state.load_full()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.inner.state.load().len()
    }

    /// Whether no instance is open.
    pub fn is_empty(&self) -> bool {
        self.inner.state.load().is_empty()
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: &ModalId) -> bool {
        self.inner.state.load().contains(id)
    }

    // --- Subscriptions ---

    /// Observe every published snapshot.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Arc<ModalSnapshot>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.listeners.add(listener)
    }

    /// Number of active listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl std::fmt::Debug for ModalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.state.load();
        f.debug_struct("ModalStore")
            .field("len", &snapshot.len())
            .field("version", &snapshot.version())
            .field("subscribers", &self.inner.listeners.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
