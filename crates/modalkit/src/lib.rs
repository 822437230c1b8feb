#![forbid(unsafe_code)]

//! modalkit public facade.
//!
//! Register a modal definition once with [`create_modal`], then open and close
//! instances of it from anywhere:
//!
//! ```
//! use modalkit::prelude::*;
//! use serde::Serialize;
//!
//! struct TitleModal;
//! impl ModalComponent for TitleModal {}
//!
//! #[derive(Serialize)]
//! struct TitleProps {
//!     title: String,
//! }
//!
//! let store = ModalStore::new();
//! let titles = create_modal_in::<TitleProps>(&store, TitleModal);
//!
//! let a = titles.open(TitleProps { title: "A".into() });
//! let b = titles.open(TitleProps { title: "B".into() });
//! assert_eq!(store.len(), 2);
//!
//! titles.close();
//! assert!(store.contains(&a));
//! assert!(!store.contains(&b));
//! ```

pub use modalkit_widgets::modal;

pub use modalkit_core::{
    CollisionPolicy, ComponentId, ComponentRegistry, ConfigError, ModalComponent, ModalId,
    ModalInstance, ModalSnapshot, ModalStore, Props, StoreConfig, Subscription,
    SubscriptionScope, register_component, resolve_component, to_props,
};
pub use modalkit_widgets::{
    CloseFn, ModalElement, ModalHandle, ModalHost, ModalProps, ModalProvider, ReconcileReport,
    ViewRenderer, create_modal, create_modal_in,
};

/// Everything an application needs to define, open, and render modals.
pub mod prelude {
    pub use modalkit_core::{ModalComponent, ModalId, ModalStore};
    pub use modalkit_widgets::{
        ModalElement, ModalHandle, ModalProps, ModalProvider, ViewRenderer, create_modal,
        create_modal_in,
    };
}
