#![forbid(unsafe_code)]

//! Core state for modalkit: component identity, the modal instance store, and
//! change subscriptions.
//!
//! This crate provides:
//! - [`ComponentRegistry`] mapping component definitions to stable
//!   [`ComponentId`]s by identity
//! - [`ModalStore`], an insertion-ordered map of live [`ModalInstance`]s that
//!   publishes immutable [`ModalSnapshot`]s
//! - [`Subscription`] and [`SubscriptionScope`] for observing store changes
//! - [`StoreConfig`] for store policy

pub mod component;
pub mod config;
pub mod id;
pub mod props;
pub mod registry;
pub mod store;
pub mod subscription;

pub use component::{ModalComponent, component_ptr_eq};
pub use config::{CollisionPolicy, ConfigError, StoreConfig};
pub use id::{ComponentId, ModalId};
pub use props::{Props, SCALAR_PROPS_KEY, to_props};
pub use registry::{ComponentRegistry, register_component, resolve_component};
pub use store::{ModalInstance, ModalSnapshot, ModalStore};
pub use subscription::{Subscription, SubscriptionScope};
