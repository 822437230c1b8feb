#![forbid(unsafe_code)]

//! Generated string identifiers for components and modal instances.
//!
//! Both id kinds are drawn from process-wide counters, so an id is never
//! handed out twice within one process, whichever registry or store asks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Global counter for component ids.
static COMPONENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Global counter for modal instance ids.
static MODAL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stable identifier assigned to a registered component definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    /// Generate a fresh, never-before-issued component id.
    pub(crate) fn generate() -> Self {
        let n = COMPONENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("modal-component-{n}")))
    }

    /// Wrap an arbitrary string as a component id.
    ///
    /// Ids built this way are not registered anywhere; resolving them only
    /// succeeds if they happen to match an id the registry generated.
    pub fn from_raw(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    /// The id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of one opened modal instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModalId(Arc<str>);

impl ModalId {
    /// Generate a fresh, process-unique modal id.
    pub fn generate() -> Self {
        let n = MODAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("modal-{n}")))
    }

    /// Wrap a caller-chosen string as a modal id.
    ///
    /// The caller is responsible for uniqueness.
    pub fn from_raw(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    /// The id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModalId {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}
