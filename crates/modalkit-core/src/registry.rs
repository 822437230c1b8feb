#![forbid(unsafe_code)]

//! Identity-keyed registry of component definitions.
//!
//! The registry gives every distinct component definition a stable
//! [`ComponentId`] so the instance store can refer to components by a plain
//! string instead of holding the definition itself.
//!
//! # Invariants
//!
//! - Registering the same definition (same allocation) twice yields the same id.
//! - Every id in the reverse map has a forward entry for the same definition.
//! - Ids are never reused for a different definition.
//! - Both maps only grow; there is no eviction. The reverse map owns a strong
//!   reference to every registered definition, so a registered allocation is
//!   never freed and its address never names another definition.
//!
//! # Failure Modes
//!
//! - `resolve()` for an unknown id returns `None` (no panic).
//! - A poisoned lock is recovered; every write leaves both maps consistent
//!   before it can panic.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use ahash::AHashMap;

use crate::component::{ModalComponent, component_addr};
use crate::id::ComponentId;

static GLOBAL_REGISTRY: LazyLock<Arc<ComponentRegistry>> =
    LazyLock::new(|| Arc::new(ComponentRegistry::new()));

#[derive(Default)]
struct RegistryMaps {
    /// Definition address -> id.
    forward: AHashMap<usize, ComponentId>,
    /// Id -> definition. Keeps every registered allocation alive.
    reverse: AHashMap<ComponentId, Arc<dyn ModalComponent>>,
}

/// Bidirectional map between component definitions and their ids.
pub struct ComponentRegistry {
    maps: RwLock<RegistryMaps>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Create an empty, isolated registry.
    pub fn new() -> Self {
        Self {
            maps: RwLock::new(RegistryMaps::default()),
        }
    }

    /// The process-wide registry used by [`ModalStore::global`](crate::ModalStore::global).
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Register a definition, returning its id.
    ///
    /// Idempotent: a definition that is already registered keeps its id.
    pub fn register(&self, definition: &Arc<dyn ModalComponent>) -> ComponentId {
        let addr = component_addr(definition);

        if let Some(id) = self.lookup(addr) {
            return id;
        }

        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock; another caller may have won the race.
        if let Some(id) = maps.forward.get(&addr) {
            return id.clone();
        }

        let id = ComponentId::generate();
        maps.forward.insert(addr, id.clone());
        maps.reverse.insert(id.clone(), Arc::clone(definition));
        tracing::debug!(
            component_id = %id,
            component = definition.name(),
            "registered modal component"
        );
        id
    }

    /// Look up the definition registered under `id`.
    pub fn resolve(&self, id: &ComponentId) -> Option<Arc<dyn ModalComponent>> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.reverse.get(id).cloned()
    }

    /// The id of an already-registered definition, without registering it.
    pub fn id_of(&self, definition: &Arc<dyn ModalComponent>) -> Option<ComponentId> {
        self.lookup(component_addr(definition))
    }

    /// Whether `id` names a registered definition.
    pub fn contains(&self, id: &ComponentId) -> bool {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.reverse.contains_key(id)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.reverse.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, addr: usize) -> Option<ComponentId> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.forward.get(&addr).cloned()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// Register `definition` in the process-wide registry.
pub fn register_component(definition: &Arc<dyn ModalComponent>) -> ComponentId {
    GLOBAL_REGISTRY.register(definition)
}

/// Resolve `id` against the process-wide registry.
pub fn resolve_component(id: &ComponentId) -> Option<Arc<dyn ModalComponent>> {
    GLOBAL_REGISTRY.resolve(id)
}
