#![forbid(unsafe_code)]

//! Integration tests: modal lifecycle across registry, store, handles, host,
//! and provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use modalkit_core::{
    CollisionPolicy, ComponentId, ComponentRegistry, ModalComponent, ModalId, ModalInstance,
    ModalStore, Props, StoreConfig, component_ptr_eq,
};
use modalkit_harness::{RecordingRenderer, RenderEvent, capture_logs};
use modalkit_widgets::{ModalHandle, ModalProvider, create_modal_in};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::Level;

struct TitleModal;
impl ModalComponent for TitleModal {
    fn name(&self) -> &str {
        "TitleModal"
    }
}

struct ConfirmModal;
impl ModalComponent for ConfirmModal {
    fn name(&self) -> &str {
        "ConfirmModal"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TitleProps {
    title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfirmProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn title(t: &str) -> TitleProps {
    TitleProps { title: t.into() }
}

fn title_props(t: &str) -> Option<Props> {
    modalkit_core::to_props(&title(t))
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn registration_is_idempotent_and_resolvable() {
    let registry = ComponentRegistry::new();
    let c: Arc<dyn ModalComponent> = Arc::new(TitleModal);
    let id = registry.register(&c);
    assert_eq!(registry.register(&c), id);
    let back = registry.resolve(&id).expect("resolves");
    assert!(component_ptr_eq(&back, &c));
}

// ============================================================================
// Store + handle
// ============================================================================

#[test]
fn title_modal_scenario() {
    let store = ModalStore::new();
    let h = create_modal_in::<TitleProps>(&store, TitleModal);

    let id1 = h.open(title("A"));
    let id2 = h.open(title("B"));
    let snap = store.snapshot();
    assert_eq!(snap.ids().cloned().collect::<Vec<_>>(), vec![id1.clone(), id2.clone()]);

    h.close();
    let snap = store.snapshot();
    assert_eq!(snap.len(), 1);
    let remaining = snap.get(&id1).expect("id1 stays open");
    let props = remaining.props.clone().expect("has props");
    assert_eq!(props.get("title"), Some(&serde_json::json!("A")));
    assert!(!snap.contains(&id2));
}

#[test]
fn open_close_inverse() {
    let store = ModalStore::new();
    let h = create_modal_in::<ConfirmProps>(&store, ConfirmModal);
    let before = store.len();
    h.open_default();
    assert_eq!(store.len(), before + 1);
    h.close();
    assert_eq!(store.len(), before);
}

#[test]
fn stack_ownership_isolation_different_definitions() {
    let store = ModalStore::new();
    let h1 = create_modal_in::<TitleProps>(&store, TitleModal);
    let h2 = create_modal_in::<ConfirmProps>(&store, ConfirmModal);

    let a = h1.open(title("mine"));
    let b = h2.open_default();
    h1.close();
    assert!(!store.contains(&a));
    assert!(store.contains(&b));
}

#[test]
fn stack_ownership_isolation_same_definition() {
    let store = ModalStore::new();
    let shared: Arc<dyn ModalComponent> = Arc::new(TitleModal);
    let h1: ModalHandle<TitleProps> = ModalHandle::new(store.clone(), Arc::clone(&shared));
    let h2: ModalHandle<TitleProps> = ModalHandle::new(store.clone(), shared);

    let a = h1.open(title("one"));
    let b = h2.open(title("two"));
    h1.close();
    assert!(!store.contains(&a));
    assert!(store.contains(&b));
}

#[test]
fn empty_close_mutates_nothing() {
    let store = ModalStore::new();
    let h = create_modal_in::<()>(&store, ConfirmModal);
    let notified = Arc::new(AtomicUsize::new(0));
    let n = Arc::clone(&notified);
    let _sub = store.subscribe(move |_| {
        n.fetch_add(1, Ordering::SeqCst);
    });

    let before = store.snapshot();
    h.close();
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[test]
fn snapshot_taken_before_mutation_is_frozen() {
    let store = ModalStore::new();
    let h = create_modal_in::<TitleProps>(&store, TitleModal);
    let old = store.snapshot();
    let id = h.open(title("x"));
    assert!(!old.contains(&id));
    assert!(store.snapshot().contains(&id));
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn renderer_receives_id_close_and_props() {
    let store = ModalStore::new();
    let h = create_modal_in::<TitleProps>(&store, TitleModal);
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());

    let id = h.open(title("Hello"));
    provider.flush();

    let element = renderer.element(&id).expect("mounted");
    assert_eq!(element.props.id(), &id);
    assert_eq!(element.props.parse::<TitleProps>().unwrap(), title("Hello"));
    assert_eq!(element.component.name(), "TitleModal");

    element.props.close();
    assert!(store.is_empty());
    provider.flush();
    assert!(renderer.live_keys().is_empty());
}

#[test]
fn render_order_follows_open_order() {
    let store = ModalStore::new();
    let titles = create_modal_in::<TitleProps>(&store, TitleModal);
    let confirms = create_modal_in::<ConfirmProps>(&store, ConfirmModal);
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());

    let a = titles.open(title("a"));
    let b = confirms.open_default();
    let c = titles.open(title("c"));
    provider.flush();
    assert_eq!(renderer.live_keys(), vec![a, b, c]);
}

#[test]
fn unknown_component_is_skipped_with_warning() {
    let store = ModalStore::new();
    let h = create_modal_in::<TitleProps>(&store, TitleModal);
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());

    let good = h.open(title("ok"));
    let orphan = ModalId::generate();
    let missing = ComponentId::from_raw("modal-component-never-registered");
    store.insert_instance(ModalInstance::new(orphan.clone(), missing.clone(), None));

    let (report, logs) = capture_logs(|| provider.flush());
    let report = report.expect("dirty");

    assert_eq!(report.mounted, vec![good.clone()]);
    assert_eq!(report.skipped, vec![(orphan.clone(), missing.clone())]);
    assert_eq!(renderer.live_keys(), vec![good]);
    assert!(store.contains(&orphan));

    let warns = logs.at_level(Level::WARN);
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0].field("component_id"), Some(missing.as_str()));
    assert_eq!(warns[0].field("modal_id"), Some(orphan.as_str()));
}

#[test]
fn unresolved_instance_is_retried_each_pass() {
    let store = ModalStore::new();
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());

    store.insert_instance(ModalInstance::new(
        ModalId::generate(),
        ComponentId::from_raw("nope"),
        None,
    ));
    let first = provider.flush().expect("dirty");
    let second = provider.render();
    assert_eq!(first.skipped.len(), 1);
    assert_eq!(second.skipped.len(), 1);
    assert_eq!(renderer.mount_count(), 0);
}

#[test]
fn collision_emits_warning() {
    let store = ModalStore::new();
    let c: Arc<dyn ModalComponent> = Arc::new(TitleModal);
    let id = ModalId::from_raw("fixed");
    store.open_modal(id.clone(), &c, None);

    let ((), logs) = capture_logs(|| store.open_modal(id.clone(), &c, None));
    let warns = logs.at_level(Level::WARN);
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0].field("modal_id"), Some("fixed"));
    assert_eq!(store.len(), 1);
}

#[test]
fn overwritten_instance_renders_new_component_and_props() {
    let store = ModalStore::new();
    let titles: Arc<dyn ModalComponent> = Arc::new(TitleModal);
    let confirms: Arc<dyn ModalComponent> = Arc::new(ConfirmModal);
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());

    let id = ModalId::from_raw("dup");
    let other = ModalId::generate();
    store.open_modal(id.clone(), &titles, title_props("A"));
    store.open_modal(other.clone(), &titles, title_props("other"));
    provider.flush();

    store.open_modal(id.clone(), &confirms, title_props("B"));
    let report = provider.flush().expect("dirty");
    assert_eq!(report.unmounted, vec![id.clone()]);
    assert_eq!(report.mounted, vec![id.clone()]);

    let element = renderer.element(&id).expect("still mounted");
    assert!(component_ptr_eq(&element.component, &confirms));
    assert_eq!(element.component.name(), "ConfirmModal");
    assert_eq!(element.props.parse::<TitleProps>().unwrap(), title("B"));
    assert_eq!(store.snapshot().position(&id), Some(0));
    assert_eq!(renderer.live_keys().len(), 2);
    assert!(renderer.element(&other).is_some());
}

#[test]
fn keep_existing_collision_leaves_rendered_instance() {
    let store =
        ModalStore::with_config(StoreConfig::new().collision_policy(CollisionPolicy::KeepExisting));
    let titles: Arc<dyn ModalComponent> = Arc::new(TitleModal);
    let confirms: Arc<dyn ModalComponent> = Arc::new(ConfirmModal);
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());

    let id = ModalId::from_raw("dup");
    store.open_modal(id.clone(), &titles, title_props("A"));
    provider.flush();
    renderer.clear_events();

    let ((), logs) = capture_logs(|| store.open_modal(id.clone(), &confirms, title_props("B")));
    assert_eq!(logs.at_level(Level::WARN).len(), 1);
    assert!(provider.flush().is_none());
    assert!(renderer.events().is_empty());

    let element = renderer.element(&id).expect("mounted");
    assert!(component_ptr_eq(&element.component, &titles));
    assert_eq!(element.props.parse::<TitleProps>().unwrap(), title("A"));
}

// ============================================================================
// Provider teardown
// ============================================================================

#[test]
fn teardown_clears_all_instances() {
    let store = ModalStore::new();
    let titles = create_modal_in::<TitleProps>(&store, TitleModal);
    let confirms = create_modal_in::<ConfirmProps>(&store, ConfirmModal);
    let renderer = RecordingRenderer::new();

    {
        let mut provider = ModalProvider::new(&store, renderer.clone());
        titles.open(title("1"));
        confirms.open_default();
        titles.open(title("2"));
        provider.flush();
        assert_eq!(renderer.live_keys().len(), 3);
    }

    assert!(store.is_empty());
    assert!(renderer.live_keys().is_empty());
    let unmounts = renderer
        .events()
        .iter()
        .filter(|e| matches!(e, RenderEvent::Unmount { .. }))
        .count();
    assert_eq!(unmounts, 3);

    // Handles keep working after a remount.
    let renderer = RecordingRenderer::new();
    let mut provider = ModalProvider::new(&store, renderer.clone());
    let id = titles.open(title("again"));
    provider.flush();
    assert_eq!(renderer.live_keys(), vec![id]);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn open_close_sequences_match_model(script in proptest::collection::vec((0usize..2, any::<bool>()), 0..48)) {
        let store = ModalStore::new();
        let handles: Vec<ModalHandle<TitleProps>> = vec![
            create_modal_in(&store, TitleModal),
            create_modal_in(&store, TitleModal),
        ];
        let mut model: Vec<Vec<ModalId>> = vec![Vec::new(), Vec::new()];
        let renderer = RecordingRenderer::new();
        let mut provider = ModalProvider::new(&store, renderer.clone());

        for (h, open) in script {
            if open {
                model[h].push(handles[h].open(title("p")));
            } else {
                model[h].pop();
                handles[h].close();
            }
            provider.flush();

            let expected: usize = model.iter().map(Vec::len).sum();
            prop_assert_eq!(store.len(), expected);
            prop_assert_eq!(renderer.live_keys().len(), expected);
            for ids in &model {
                for id in ids {
                    prop_assert!(store.contains(id));
                }
            }
        }
    }
}
