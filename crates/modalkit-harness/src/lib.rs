#![forbid(unsafe_code)]

//! Test harness for modalkit.
//!
//! - [`RecordingRenderer`]: a [`ViewRenderer`] that records every mount and
//!   unmount into a shared log, so a test can keep a clone after handing the
//!   renderer to a provider.
//! - [`LogCapture`]: a `tracing_subscriber` layer that collects events, plus
//!   [`capture_logs`] to run a closure under it.

use std::sync::{Arc, Mutex, PoisonError};

use modalkit_core::{ComponentId, ModalId, Props};
use modalkit_widgets::{ModalElement, ViewRenderer};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

// ============================================================================
// RecordingRenderer
// ============================================================================

/// One renderer call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Mount {
        key: ModalId,
        component: String,
        component_id: ComponentId,
        props: Option<Props>,
    },
    Unmount {
        key: ModalId,
    },
}

impl RenderEvent {
    pub fn key(&self) -> &ModalId {
        match self {
            Self::Mount { key, .. } | Self::Unmount { key } => key,
        }
    }
}

#[derive(Default)]
struct RecorderState {
    events: Vec<RenderEvent>,
    live: Vec<ModalElement>,
}

/// Renderer that records calls and tracks what is currently mounted.
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn events(&self) -> Vec<RenderEvent> {
        self.lock().events.clone()
    }

    /// Keys currently mounted, in mount order.
    pub fn live_keys(&self) -> Vec<ModalId> {
        self.lock().live.iter().map(|e| e.key.clone()).collect()
    }

    /// The mounted element for `key`, if any.
    pub fn element(&self, key: &ModalId) -> Option<ModalElement> {
        self.lock().live.iter().find(|e| &e.key == key).cloned()
    }

    /// Number of mount calls so far.
    pub fn mount_count(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, RenderEvent::Mount { .. }))
            .count()
    }

    /// Forget recorded calls (live elements are kept).
    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ViewRenderer for RecordingRenderer {
    fn mount(&mut self, element: ModalElement) {
        let mut state = self.lock();
        state.events.push(RenderEvent::Mount {
            key: element.key.clone(),
            component: element.component.name().to_owned(),
            component_id: element.component_id.clone(),
            props: element.props.values().cloned(),
        });
        state.live.push(element);
    }

    fn unmount(&mut self, key: &ModalId) {
        let mut state = self.lock();
        state.events.push(RenderEvent::Unmount { key: key.clone() });
        state.live.retain(|e| &e.key != key);
    }
}

impl std::fmt::Debug for RecordingRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RecordingRenderer")
            .field("events", &state.events.len())
            .field("live", &state.live.len())
            .finish()
    }
}

// ============================================================================
// LogCapture
// ============================================================================

/// One captured tracing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Value of a structured field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_owned(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.push((field.name().to_owned(), value.to_owned()));
        }
    }
}

/// Layer that stores every event it sees.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events captured so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured events at `level`.
    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedEvent {
                level: *metadata.level(),
                target: metadata.target().to_owned(),
                message: visitor.message,
                fields: visitor.fields,
            });
    }
}

/// Run `f` with a capturing subscriber as the thread's default.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, LogCapture) {
    let capture = LogCapture::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, capture)
}
