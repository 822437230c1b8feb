#![forbid(unsafe_code)]

//! Per-definition open/close API.
//!
//! # Invariants
//!
//! - `open()` returns an id that is already live in the store.
//! - `close()` pops the most recent id *this handle* opened; it never touches
//!   instances opened by other handles.
//! - Ids are pushed before the store is mutated and popped before the store
//!   is mutated, and the stack lock is never held across a store call, so
//!   store listeners may use the handle re-entrantly.
//! - Every `open()` drops settled ids that are no longer in the store, so the
//!   stack stays bounded by the number of live instances plus opens in flight.
//!
//! # Failure Modes
//!
//! - `close()` with nothing opened is a no-op.
//! - `close()` after the top instance already closed itself (and before the
//!   next `open()`) pops the stale id; the store ignores it.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use modalkit_core::{ComponentId, ModalComponent, ModalId, ModalStore, to_props};
use serde::Serialize;

/// Open/close API bound to one modal definition.
///
/// `P` is the prop type callers must supply to [`open`](Self::open). Prop
/// types that implement `Default` (including `()`) can also be opened with
/// [`open_default`](Self::open_default).
pub struct ModalHandle<P = ()> {
    store: ModalStore,
    component: Arc<dyn ModalComponent>,
    component_id: ComponentId,
    /// Ids opened by this handle, oldest first.
    stack: Mutex<Vec<StackEntry>>,
    _props: PhantomData<fn(P)>,
}

/// One id on a handle stack. `settled` is set once the store insert returned,
/// so an id missing from a later snapshot is known to be closed.
struct StackEntry {
    id: ModalId,
    settled: bool,
}

/// Create a handle for `component` on the process-wide store.
pub fn create_modal<P>(component: impl ModalComponent) -> ModalHandle<P> {
    ModalHandle::new(ModalStore::global(), Arc::new(component))
}

/// Create a handle for `component` on `store`.
pub fn create_modal_in<P>(store: &ModalStore, component: impl ModalComponent) -> ModalHandle<P> {
    ModalHandle::new(store.clone(), Arc::new(component))
}

impl<P> ModalHandle<P> {
    /// Create a handle for a shared definition.
    ///
    /// Several handles may wrap the same `Arc`; they share a component id but
    /// each keeps its own stack.
    pub fn new(store: ModalStore, component: Arc<dyn ModalComponent>) -> Self {
        let component_id = store.registry().register(&component);
        Self {
            store,
            component,
            component_id,
            stack: Mutex::new(Vec::new()),
            _props: PhantomData,
        }
    }

    /// Close the most recent instance this handle opened.
    pub fn close(&self) {
        let popped = self
            .stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match popped {
            Some(entry) => self.store.close_modal(&entry.id),
            None => tracing::trace!(
                component_id = %self.component_id,
                "close on modal handle with nothing open"
            ),
        }
    }

    /// Close every instance this handle opened, newest first.
    pub fn close_all(&self) {
        let ids = std::mem::take(&mut *self.stack.lock().unwrap_or_else(PoisonError::into_inner));
        for entry in ids.iter().rev() {
            self.store.close_modal(&entry.id);
        }
    }

    /// Ids opened by this handle that are still live, oldest first.
    pub fn open_ids(&self) -> Vec<ModalId> {
        let snapshot = self.store.snapshot();
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| snapshot.contains(&entry.id))
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Number of live instances opened by this handle.
    pub fn open_count(&self) -> usize {
        self.open_ids().len()
    }

    /// Whether any instance opened by this handle is live.
    pub fn is_open(&self) -> bool {
        self.open_count() > 0
    }

    /// Id of the bound component.
    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// The bound component definition.
    pub fn component(&self) -> &Arc<dyn ModalComponent> {
        &self.component
    }

    /// The store this handle opens into.
    pub fn store(&self) -> &ModalStore {
        &self.store
    }

    fn push(&self, id: ModalId) {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StackEntry { id, settled: false });
    }

    /// Mark `id` as inserted and drop settled ids that have since closed.
    fn settle(&self, id: &ModalId) {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.store.snapshot();
        if let Some(entry) = stack.iter_mut().rev().find(|entry| &entry.id == id) {
            entry.settled = true;
        }
        stack.retain(|entry| !entry.settled || snapshot.contains(&entry.id));
    }

    fn depth(&self) -> usize {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<P: Serialize> ModalHandle<P> {
    /// Open a new instance with `props`, returning its id.
    ///
    /// The id is live in the store when this returns; the visual mount
    /// happens on the host's next flush.
    pub fn open(&self, props: P) -> ModalId {
        let id = ModalId::generate();
        self.push(id.clone());
        self.store
            .open_modal(id.clone(), &self.component, to_props(&props));
        self.settle(&id);
        id
    }
}

impl<P: Serialize + Default> ModalHandle<P> {
    /// Open a new instance with default props.
    pub fn open_default(&self) -> ModalId {
        self.open(P::default())
    }
}

impl<P> std::fmt::Debug for ModalHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalHandle")
            .field("component", &self.component.name())
            .field("component_id", &self.component_id)
            .field("depth", &self.depth())
            .finish()
    }
}
