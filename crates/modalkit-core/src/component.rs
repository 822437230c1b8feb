#![forbid(unsafe_code)]

//! The opaque component-definition contract.
//!
//! A component definition is whatever the host UI framework mounts. modalkit
//! never looks inside one; it only needs a stable identity (the allocation
//! behind the `Arc`) and a name for diagnostics.

use std::any::Any;
use std::sync::Arc;

/// Upcast helper so `dyn ModalComponent` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A renderable modal definition.
///
/// Definitions are compared by identity, never by value: two `Arc`s to the
/// same allocation are the same component, two equal values in separate
/// allocations are different components.
pub trait ModalComponent: AsAny + Send + Sync + 'static {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl dyn ModalComponent {
    /// Downcast to the concrete definition type.
    pub fn downcast_ref<T: ModalComponent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether this definition is of type `T`.
    pub fn is<T: ModalComponent>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Address of the allocation behind a component `Arc`, ignoring vtable metadata.
#[inline]
pub(crate) fn component_addr(component: &Arc<dyn ModalComponent>) -> usize {
    Arc::as_ptr(component) as *const () as usize
}

/// Identity comparison of two component definitions.
#[inline]
pub fn component_ptr_eq(a: &Arc<dyn ModalComponent>, b: &Arc<dyn ModalComponent>) -> bool {
    component_addr(a) == component_addr(b)
}
