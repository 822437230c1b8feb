#![no_main]

//! Drive random open/close/self-close/clear sequences through handles and a
//! host, checking ownership and reconciliation invariants after every step.

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modalkit_core::{ComponentId, ModalComponent, ModalId, ModalInstance, ModalStore};
use modalkit_widgets::{ModalElement, ModalHandle, ModalHost, ViewRenderer};

struct Probe;
impl ModalComponent for Probe {}

#[derive(Debug, Arbitrary)]
enum Op {
    Open { handle: u8 },
    Close { handle: u8 },
    CloseAll { handle: u8 },
    SelfClose { index: u8 },
    InsertOrphan,
    Overwrite { index: u8, title: u8 },
    Clear,
    Flush,
}

#[derive(Default)]
struct Live {
    elements: Vec<ModalElement>,
}

impl ViewRenderer for Live {
    fn mount(&mut self, element: ModalElement) {
        assert!(
            !self.elements.iter().any(|e| e.key == element.key),
            "key mounted twice"
        );
        self.elements.push(element);
    }

    fn unmount(&mut self, key: &ModalId) {
        let before = self.elements.len();
        self.elements.retain(|e| &e.key != key);
        assert_eq!(before, self.elements.len() + 1, "unmount of unknown key");
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let store = ModalStore::new();
    let shared: Arc<dyn ModalComponent> = Arc::new(Probe);
    let other: Arc<dyn ModalComponent> = Arc::new(Probe);
    let handles: Vec<ModalHandle> = (0..3)
        .map(|_| ModalHandle::new(store.clone(), Arc::clone(&shared)))
        .collect();
    let mut host = ModalHost::new(&store);
    let mut live = Live::default();

    for op in ops.into_iter().take(256) {
        match op {
            Op::Open { handle } => {
                handles[handle as usize % 3].open_default();
            }
            Op::Close { handle } => {
                let h = &handles[handle as usize % 3];
                let others: Vec<ModalId> = handles
                    .iter()
                    .filter(|o| !std::ptr::eq(*o, h))
                    .flat_map(|o| o.open_ids())
                    .collect();
                h.close();
                for id in &others {
                    assert!(store.contains(id), "close removed another handle's modal");
                }
            }
            Op::CloseAll { handle } => handles[handle as usize % 3].close_all(),
            Op::SelfClose { index } => {
                if !live.elements.is_empty() {
                    let i = index as usize % live.elements.len();
                    live.elements[i].props.close();
                }
            }
            Op::InsertOrphan => store.insert_instance(ModalInstance::new(
                ModalId::generate(),
                ComponentId::from_raw("orphan"),
                None,
            )),
            Op::Overwrite { index, title } => {
                let snapshot = store.snapshot();
                if !snapshot.is_empty() {
                    let id = snapshot.ids().nth(index as usize % snapshot.len()).cloned();
                    if let Some(id) = id {
                        let props = serde_json::json!({ "title": title });
                        store.open_modal(id, &other, props.as_object().cloned());
                    }
                }
            }
            Op::Clear => store.clear(),
            Op::Flush => {
                host.flush(&mut live);
            }
        }
    }

    host.render(&mut live);
    let snapshot = store.snapshot();
    for element in &live.elements {
        let instance = snapshot.get(&element.key).expect("mounted key not in store");
        assert_eq!(element.component_id, instance.component_id, "stale component");
        assert_eq!(element.props.values(), instance.props.as_ref(), "stale props");
    }
});
