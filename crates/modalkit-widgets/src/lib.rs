#![forbid(unsafe_code)]

//! Modal handles, render reconciliation, and the provider scope for modalkit.

pub mod modal;

pub use modal::{
    CloseFn, ModalElement, ModalHandle, ModalHost, ModalProps, ModalProvider, ReconcileReport,
    ViewRenderer, create_modal, create_modal_in,
};
