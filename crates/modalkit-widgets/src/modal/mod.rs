#![forbid(unsafe_code)]

//! Programmatic modal lifecycle: handles that open and close instances,
//! a host that reconciles the store against a view renderer, and a provider
//! scope that owns the host.
//!
//! # Ownership
//!
//! Each [`ModalHandle`] keeps a private LIFO stack of the instance ids it
//! opened. `close()` only ever pops from that stack, so two handles never
//! close each other's instances, even when they share a component definition.
//! An instance can also close itself through the `close` callback injected
//! into its [`ModalProps`]; that path is addressed by id, not by stack.
//!
//! # Rendering
//!
//! [`ModalHost`] subscribes to the store and marks itself dirty on every
//! change. The host framework decides when to call [`ModalHost::flush`], so
//! several opens/closes within one frame collapse into a single pass.
//!
//! # Example
//!
//! ```ignore
//! use modalkit_widgets::modal::{ModalProvider, create_modal_in};
//!
//! let store = ModalStore::new();
//! let confirm = create_modal_in::<ConfirmProps>(&store, ConfirmDialog);
//! let mut provider = ModalProvider::new(&store, renderer);
//!
//! let id = confirm.open(ConfirmProps { title: "Delete?".into() });
//! provider.flush(); // renderer mounts `id`
//!
//! confirm.close();
//! provider.flush(); // renderer unmounts `id`
//! ```

mod handle;
mod host;
mod provider;

pub use handle::{ModalHandle, create_modal, create_modal_in};
pub use host::{CloseFn, ModalElement, ModalHost, ModalProps, ReconcileReport, ViewRenderer};
pub use provider::ModalProvider;
