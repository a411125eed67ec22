//! Property tests for the document store invariants.

use mdpad::store::{DocumentStore, MemoryStorage};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create,
    Delete(usize),
    Rename(usize, String),
    SetContent(usize, String),
    Activate(usize),
    Reload,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        (0usize..8).prop_map(Op::Delete),
        (0usize..8, "[a-z]{0,8}").prop_map(|(i, s)| Op::Rename(i, s)),
        (0usize..8, ".{0,24}").prop_map(|(i, s)| Op::SetContent(i, s)),
        (0usize..8).prop_map(Op::Activate),
        Just(Op::Reload),
    ]
}

fn id_at(store: &DocumentStore<MemoryStorage>, index: usize) -> Option<String> {
    let len = store.len();
    (len > 0).then(|| store.documents()[index % len].id().to_string())
}

proptest! {
    #[test]
    fn active_selection_always_resolves(ops in prop::collection::vec(op(), 0..40)) {
        let mut store = DocumentStore::load(MemoryStorage::new());
        prop_assert!(!store.is_empty());

        for op in ops {
            let before = store.documents().to_vec();
            match op {
                Op::Create => {
                    let doc = store.create();
                    prop_assert_eq!(doc.created_at(), doc.updated_at());
                }
                Op::Delete(i) => {
                    if let Some(id) = id_at(&store, i) {
                        store.delete(&id);
                    }
                }
                Op::Rename(i, name) => {
                    if let Some(id) = id_at(&store, i) {
                        store.rename(&id, name);
                    }
                }
                Op::SetContent(i, content) => {
                    if let Some(id) = id_at(&store, i) {
                        store.set_content(&id, content);
                    }
                }
                Op::Activate(i) => {
                    if let Some(id) = id_at(&store, i) {
                        prop_assert!(store.set_active(Some(id.as_str())).is_ok());
                    }
                }
                Op::Reload => {
                    store = DocumentStore::load(store.into_storage());
                    prop_assert!(!store.is_empty());
                }
            }

            if !store.is_empty() {
                prop_assert!(store.active().is_some());
            }
            for doc in store.documents() {
                prop_assert!(doc.updated_at() >= doc.created_at());
                if let Some(prior) = before.iter().find(|d| d.id() == doc.id()) {
                    prop_assert_eq!(prior.created_at(), doc.created_at());
                    prop_assert!(doc.updated_at() >= prior.updated_at());
                }
            }
            let mut ids: Vec<_> = store.documents().iter().map(|d| d.id().to_string()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), store.len());
        }
    }

    #[test]
    fn deleting_active_selects_neighbor(count in 1usize..6, pick in 0usize..6) {
        let mut store = DocumentStore::load(MemoryStorage::new());
        for _ in 1..count {
            store.create();
        }
        let index = pick % store.len();
        let ids: Vec<String> = store.documents().iter().map(|d| d.id().to_string()).collect();
        store.set_active(Some(ids[index].as_str())).unwrap();
        store.delete(&ids[index]);

        let remaining: Vec<&String> = ids.iter().filter(|id| **id != ids[index]).collect();
        let expected = if remaining.is_empty() {
            None
        } else {
            Some(remaining[index.min(remaining.len() - 1)].as_str())
        };
        prop_assert_eq!(store.active_id(), expected);
    }
}
