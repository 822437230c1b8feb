#![forbid(unsafe_code)]

//! Scoped lifecycle wrapper for the modal layer.
//!
//! A `ModalProvider` sits next to the application content for as long as the
//! application root is mounted. It owns the [`ModalHost`] and the renderer,
//! and when it is torn down it clears the whole store so no stale modal
//! survives a remount of the root.

use modalkit_core::ModalStore;

use super::host::{ModalHost, ReconcileReport, ViewRenderer};

/// Owns the host and renderer for one application root.
///
/// # Invariants
///
/// - After drop, the store is empty and the renderer has been told to
///   unmount every instance it had mounted.
/// - The component registry is never cleared.
pub struct ModalProvider<R: ViewRenderer> {
    host: ModalHost,
    renderer: R,
}

impl<R: ViewRenderer> ModalProvider<R> {
    /// Mount a provider for `store`.
    pub fn new(store: &ModalStore, renderer: R) -> Self {
        tracing::debug!("mounting modal provider");
        Self {
            host: ModalHost::new(store),
            renderer,
        }
    }

    /// Mount a provider for the process-wide store.
    pub fn global(renderer: R) -> Self {
        Self::new(&ModalStore::global(), renderer)
    }

    /// Run a reconcile pass if the store changed.
    pub fn flush(&mut self) -> Option<ReconcileReport> {
        self.host.flush(&mut self.renderer)
    }

    /// Run a reconcile pass unconditionally.
    pub fn render(&mut self) -> ReconcileReport {
        self.host.render(&mut self.renderer)
    }

    pub fn host(&self) -> &ModalHost {
        &self.host
    }

    pub fn store(&self) -> &ModalStore {
        self.host.store()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Tear the provider down now. Equivalent to dropping it.
    pub fn teardown(self) {
        drop(self);
    }
}

impl<R: ViewRenderer> Drop for ModalProvider<R> {
    fn drop(&mut self) {
        let store = self.host.store().clone();
        tracing::debug!(open = store.len(), "tearing down modal provider");
        store.clear();
        self.host.render(&mut self.renderer);
    }
}

impl<R: ViewRenderer> std::fmt::Debug for ModalProvider<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalProvider")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
