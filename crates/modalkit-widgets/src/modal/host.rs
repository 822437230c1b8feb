#![forbid(unsafe_code)]

//! Render reconciliation between the modal store and a view renderer.
//!
//! The host keeps the instance record behind every key it has mounted. Each
//! pass walks the current snapshot in order and tells the renderer about the
//! difference: newly live instances are mounted, vanished ones are unmounted,
//! and unchanged ones are left alone. A key whose instance was replaced in
//! the store (same id, new component or props) is unmounted and mounted
//! again with the new record.
//!
//! # Invariants
//!
//! - Unmounts of a pass are issued before its mounts. Unmounts follow the
//!   previous mount order, mounts follow snapshot order.
//! - A key is mounted at most once until it is unmounted.
//! - After a pass, every mounted key renders exactly the instance the
//!   snapshot holds for it.
//! - An instance whose component id does not resolve is never mounted; it
//!   stays in the store and is retried on the next pass.
//!
//! # Failure Modes
//!
//! - Unresolved component: `warn` diagnostic naming the component id, the
//!   instance is skipped, the rest of the pass continues.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use modalkit_core::{
    ComponentId, ModalComponent, ModalId, ModalInstance, ModalStore, Props, SubscriptionScope,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Zero-argument callback that closes one specific instance.
pub type CloseFn = Arc<dyn Fn() + Send + Sync>;

/// Props handed to a mounted modal: its own id, a self-close callback, and
/// the caller-supplied values.
#[derive(Clone)]
pub struct ModalProps {
    id: ModalId,
    close: CloseFn,
    values: Option<Props>,
}

impl ModalProps {
    pub fn new(id: ModalId, close: CloseFn, values: Option<Props>) -> Self {
        Self { id, close, values }
    }

    /// The instance id.
    pub fn id(&self) -> &ModalId {
        &self.id
    }

    /// Close this instance. Addressed by id, independent of any handle.
    pub fn close(&self) {
        (self.close)();
    }

    /// The close callback, for handing to event handlers.
    pub fn close_fn(&self) -> CloseFn {
        Arc::clone(&self.close)
    }

    /// Caller-supplied values, if the instance was opened with any.
    pub fn values(&self) -> Option<&Props> {
        self.values.as_ref()
    }

    /// One caller-supplied value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.as_ref()?.get(key)
    }

    /// Deserialize the caller-supplied values into a typed prop struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let value = match &self.values {
            Some(map) => Value::Object(map.clone()),
            None => Value::Null,
        };
        serde_json::from_value(value)
    }

    /// Flat view with `id` injected first and caller values layered on top.
    pub fn merged(&self) -> Props {
        let mut merged = Props::new();
        merged.insert("id".to_owned(), Value::String(self.id.as_str().to_owned()));
        if let Some(values) = &self.values {
            merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

impl std::fmt::Debug for ModalProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalProps")
            .field("id", &self.id)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

/// One resolved instance, ready to be mounted.
#[derive(Clone)]
pub struct ModalElement {
    /// Reconciliation key (the instance id).
    pub key: ModalId,
    pub component_id: ComponentId,
    pub component: Arc<dyn ModalComponent>,
    pub props: ModalProps,
}

impl std::fmt::Debug for ModalElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalElement")
            .field("key", &self.key)
            .field("component", &self.component.name())
            .field("component_id", &self.component_id)
            .field("props", &self.props)
            .finish()
    }
}

/// The UI framework side: mounts and unmounts modal components.
pub trait ViewRenderer {
    /// Mount a newly opened instance.
    fn mount(&mut self, element: ModalElement);

    /// Unmount a previously mounted instance.
    fn unmount(&mut self, key: &ModalId);
}

impl<R: ViewRenderer + ?Sized> ViewRenderer for &mut R {
    fn mount(&mut self, element: ModalElement) {
        (**self).mount(element);
    }

    fn unmount(&mut self, key: &ModalId) {
        (**self).unmount(key);
    }
}

impl<R: ViewRenderer + ?Sized> ViewRenderer for Box<R> {
    fn mount(&mut self, element: ModalElement) {
        (**self).mount(element);
    }

    fn unmount(&mut self, key: &ModalId) {
        (**self).unmount(key);
    }
}

/// What one reconcile pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Store version the pass rendered.
    pub version: u64,
    /// Keys mounted in this pass, in snapshot order.
    pub mounted: Vec<ModalId>,
    /// Keys unmounted in this pass, in previous mount order.
    pub unmounted: Vec<ModalId>,
    /// Instances skipped because their component id did not resolve.
    pub skipped: Vec<(ModalId, ComponentId)>,
}

impl ReconcileReport {
    /// Whether the pass changed nothing on the renderer side.
    pub fn is_noop(&self) -> bool {
        self.mounted.is_empty() && self.unmounted.is_empty()
    }
}

/// Store subscriber that drives a [`ViewRenderer`].
pub struct ModalHost {
    store: ModalStore,
    dirty: Arc<AtomicBool>,
    mounted: IndexMap<ModalId, ModalInstance>,
    subscriptions: SubscriptionScope,
}

impl ModalHost {
    /// Subscribe to `store`. The first flush renders whatever is already open.
    pub fn new(store: &ModalStore) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&dirty);
        let mut subscriptions = SubscriptionScope::new();
        subscriptions.hold(store.subscribe(move |_| flag.store(true, Ordering::Release)));
        Self {
            store: store.clone(),
            dirty,
            mounted: IndexMap::new(),
            subscriptions,
        }
    }

    /// Whether the store changed since the last pass.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Run a pass if the store changed since the last one.
    pub fn flush<R: ViewRenderer + ?Sized>(&mut self, renderer: &mut R) -> Option<ReconcileReport> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(self.reconcile(renderer))
    }

    /// Run a pass unconditionally.
    pub fn render<R: ViewRenderer + ?Sized>(&mut self, renderer: &mut R) -> ReconcileReport {
        self.dirty.store(false, Ordering::Release);
        self.reconcile(renderer)
    }

    /// Ids currently mounted, in mount order.
    pub fn mounted(&self) -> impl ExactSizeIterator<Item = &ModalId> + '_ {
        self.mounted.keys()
    }

    /// The store this host observes.
    pub fn store(&self) -> &ModalStore {
        &self.store
    }

    fn reconcile<R: ViewRenderer + ?Sized>(&mut self, renderer: &mut R) -> ReconcileReport {
        let snapshot = self.store.snapshot();
        let _span = tracing::debug_span!(
            "modal_reconcile",
            version = snapshot.version(),
            instances = snapshot.len()
        )
        .entered();

        let registry = self.store.registry();
        let mut report = ReconcileReport {
            version: snapshot.version(),
            ..ReconcileReport::default()
        };
        let mut live = IndexMap::with_capacity(snapshot.len());
        let mut to_mount = Vec::new();

        for instance in snapshot.iter() {
            let Some(component) = registry.resolve(&instance.component_id) else {
                tracing::warn!(
                    component_id = %instance.component_id,
                    modal_id = %instance.id,
                    "modal component is not registered; skipping instance"
                );
                report
                    .skipped
                    .push((instance.id.clone(), instance.component_id.clone()));
                continue;
            };

            live.insert(instance.id.clone(), instance.clone());
            match self.mounted.get(&instance.id) {
                Some(current) if current == instance => continue,
                Some(_) => tracing::debug!(
                    modal_id = %instance.id,
                    component_id = %instance.component_id,
                    "modal instance replaced; remounting"
                ),
                None => {}
            }

            let store = self.store.clone();
            let id = instance.id.clone();
            let close: CloseFn = Arc::new(move || store.close_modal(&id));
            to_mount.push(ModalElement {
                key: instance.id.clone(),
                component_id: instance.component_id.clone(),
                component,
                props: ModalProps::new(instance.id.clone(), close, instance.props.clone()),
            });
        }

        for (key, current) in &self.mounted {
            if live.get(key) != Some(current) {
                renderer.unmount(key);
                report.unmounted.push(key.clone());
            }
        }
        for element in to_mount {
            report.mounted.push(element.key.clone());
            renderer.mount(element);
        }
        self.mounted = live;

        tracing::trace!(
            mounted = report.mounted.len(),
            unmounted = report.unmounted.len(),
            skipped = report.skipped.len(),
            "modal reconcile pass complete"
        );
        report
    }
}

impl std::fmt::Debug for ModalHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalHost")
            .field("mounted", &self.mounted.len())
            .field("dirty", &self.is_dirty())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::handle::create_modal_in;
    use modalkit_core::ModalInstance;
    use serde::{Deserialize, Serialize};

    struct TitleModal;
    impl ModalComponent for TitleModal {}

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TitleProps {
        title: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Mount(ModalId, String),
        Unmount(ModalId),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        elements: Vec<ModalElement>,
    }

    impl ViewRenderer for Recorder {
        fn mount(&mut self, element: ModalElement) {
            self.calls.push(Call::Mount(
                element.key.clone(),
                element.component.name().to_owned(),
            ));
            self.elements.push(element);
        }

        fn unmount(&mut self, key: &ModalId) {
            self.calls.push(Call::Unmount(key.clone()));
        }
    }

    #[test]
    fn first_flush_renders_existing() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let id = h.open_default();

        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();
        let report = host.flush(&mut r).expect("initially dirty");
        assert_eq!(report.mounted, vec![id]);
    }

    #[test]
    fn flush_is_noop_when_clean() {
        let store = ModalStore::new();
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();
        assert!(host.flush(&mut r).is_some());
        assert!(host.flush(&mut r).is_none());
        assert!(r.calls.is_empty());
    }

    #[test]
    fn mutations_coalesce_into_one_pass() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();
        host.flush(&mut r);

        let a = h.open_default();
        let b = h.open_default();
        let c = h.open_default();
        h.close();
        assert!(host.is_dirty());

        let report = host.flush(&mut r).expect("dirty");
        assert_eq!(report.mounted, vec![a, b]);
        assert!(report.unmounted.is_empty());
        assert!(!r.calls.contains(&Call::Unmount(c)));
    }

    #[test]
    fn close_unmounts_on_next_pass() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();

        let id = h.open_default();
        host.flush(&mut r);
        h.close();
        let report = host.flush(&mut r).expect("dirty");
        assert_eq!(report.unmounted, vec![id.clone()]);
        assert_eq!(r.calls.last(), Some(&Call::Unmount(id)));
        assert_eq!(host.mounted().len(), 0);
    }

    #[test]
    fn unchanged_instances_are_not_remounted() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();

        h.open_default();
        host.flush(&mut r);
        h.open_default();
        let report = host.flush(&mut r).expect("dirty");
        assert_eq!(report.mounted.len(), 1);
        let mounts = r.calls.iter().filter(|c| matches!(c, Call::Mount(..))).count();
        assert_eq!(mounts, 2);
    }

    #[test]
    fn replaced_instance_is_remounted() {
        let store = ModalStore::new();
        let first: Arc<dyn ModalComponent> = Arc::new(TitleModal);
        let second: Arc<dyn ModalComponent> = Arc::new(TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();

        let id = ModalId::from_raw("dup");
        store.open_modal(id.clone(), &first, serde_json::json!({"title": "A"}).as_object().cloned());
        host.flush(&mut r);
        store.open_modal(id.clone(), &second, serde_json::json!({"title": "B"}).as_object().cloned());

        let report = host.flush(&mut r).expect("dirty");
        assert_eq!(report.unmounted, vec![id.clone()]);
        assert_eq!(report.mounted, vec![id.clone()]);
        let latest = r.elements.last().unwrap();
        assert!(modalkit_core::component_ptr_eq(&latest.component, &second));
        assert_eq!(latest.props.get("title"), Some(&serde_json::json!("B")));

        // A pass with nothing new leaves the replacement alone.
        assert!(host.render(&mut r).is_noop());
    }

    #[test]
    fn injected_props_carry_id_close_and_values() {
        let store = ModalStore::new();
        let h = create_modal_in::<TitleProps>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();

        let id = h.open(TitleProps { title: "A".into() });
        host.flush(&mut r);

        let element = &r.elements[0];
        assert_eq!(element.props.id(), &id);
        assert_eq!(
            element.props.parse::<TitleProps>().unwrap(),
            TitleProps { title: "A".into() }
        );
        assert_eq!(element.props.get("title"), Some(&serde_json::json!("A")));
        let merged = element.props.merged();
        assert_eq!(merged.get("id"), Some(&serde_json::json!(id.as_str())));
        assert_eq!(merged.get("title"), Some(&serde_json::json!("A")));
    }

    #[test]
    fn self_close_is_id_addressed() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();

        let first = h.open_default();
        let second = h.open_default();
        host.flush(&mut r);

        // The older instance closes itself; the handle's top stays open.
        let element = r.elements.iter().find(|e| e.key == first).unwrap();
        element.props.close();
        assert!(!store.contains(&first));
        assert!(store.contains(&second));

        let report = host.flush(&mut r).expect("dirty");
        assert_eq!(report.unmounted, vec![first]);
    }

    #[test]
    fn unresolved_component_is_skipped() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();

        let good = h.open_default();
        let orphan = ModalId::generate();
        let missing = ComponentId::from_raw("modal-component-missing");
        store.insert_instance(ModalInstance::new(orphan.clone(), missing.clone(), None));
        let later = h.open_default();

        let report = host.flush(&mut r).expect("dirty");
        assert_eq!(report.mounted, vec![good, later]);
        assert_eq!(report.skipped, vec![(orphan.clone(), missing)]);
        assert!(store.contains(&orphan));
    }

    #[test]
    fn reference_renderer_works() {
        let store = ModalStore::new();
        let h = create_modal_in::<()>(&store, TitleModal);
        let mut host = ModalHost::new(&store);
        let mut r = Recorder::default();
        {
            let mut boxed: Box<dyn ViewRenderer + '_> = Box::new(&mut r);
            h.open_default();
            host.flush(&mut boxed);
        }
        assert_eq!(r.calls.len(), 1);
    }

    #[test]
    fn dropping_host_unsubscribes() {
        let store = ModalStore::new();
        let host = ModalHost::new(&store);
        assert_eq!(store.subscriber_count(), 1);
        drop(host);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn parse_unit_from_absent_props() {
        let props = ModalProps::new(ModalId::generate(), Arc::new(|| {}), None);
        props.parse::<()>().unwrap();
        assert!(props.values().is_none());
        assert!(props.get("anything").is_none());
    }
}
