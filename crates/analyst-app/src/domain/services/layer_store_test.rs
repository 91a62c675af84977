use analyst_types::LayerStatus;
use serde_json::json;

use super::LayerStore;

#[test]
fn it_starts_pending_on_layer_one() {
    let store = LayerStore::new();
    assert_eq!(store.current_layer(), 1);
    assert_eq!(store.layers().len(), 5);
    assert!(store
        .layers()
        .iter()
        .all(|entry| entry.status == LayerStatus::Pending && entry.data.is_none()));
    assert_eq!(store.progress(), 0.0);
}

#[test]
fn it_tracks_the_last_valid_current_layer() {
    let sequences: Vec<Vec<i64>> = vec![
        vec![1, 2, 3],
        vec![5, 0, 6, -1],
        vec![3, 99, 2, 7, 4],
        vec![0, -5, 10],
        vec![2, 2, 5, 1],
    ];

    for sequence in sequences {
        let mut store = LayerStore::new();
        let mut expected = 1u8;
        for n in &sequence {
            store.set_current_layer(*n);
            if (1..=5).contains(n) {
                expected = *n as u8;
            }
        }
        assert_eq!(store.current_layer(), expected, "sequence {:?}", sequence);
    }
}

#[test]
fn it_ignores_out_of_range_layers_entirely() {
    let mut store = LayerStore::new();
    store.set_current_layer(0);
    store.set_current_layer(6);
    store.complete_layer(6);
    store.fail_layer(-1, None);
    store.set_layer_data(9, Some(json!(1)));
    assert_eq!(store, LayerStore::new());
}

#[test]
fn it_advances_after_completing_a_layer() {
    for n in 1..5i64 {
        let mut store = LayerStore::new();
        store.complete_layer(n);
        assert_eq!(store.status(n), Some(LayerStatus::Completed));
        assert_eq!(i64::from(store.current_layer()), n + 1);
        assert_eq!(store.status(n + 1), Some(LayerStatus::Active));
    }
}

#[test]
fn it_stays_on_the_last_layer() {
    let mut store = LayerStore::new();
    for n in 1..=5 {
        store.complete_layer(n);
    }
    assert_eq!(store.current_layer(), 5);
    assert!(store.is_complete());
    assert_eq!(store.progress(), 1.0);
}

#[test]
fn it_does_not_reactivate_completed_layers() {
    let mut store = LayerStore::new();
    store.complete_layer(2);
    store.set_current_layer(2);
    assert_eq!(store.current_layer(), 2);
    assert_eq!(store.status(2), Some(LayerStatus::Completed));
}

#[test]
fn it_records_history() {
    let mut store = LayerStore::new();
    store.set_current_layer(1);
    store.complete_layer(1);

    let history: Vec<(u8, LayerStatus, LayerStatus)> = store
        .history()
        .iter()
        .map(|t| (t.layer, t.from, t.to))
        .collect();
    assert_eq!(
        history,
        vec![
            (1, LayerStatus::Pending, LayerStatus::Active),
            (1, LayerStatus::Active, LayerStatus::Completed),
            (2, LayerStatus::Pending, LayerStatus::Active),
        ]
    );
}

#[test]
fn it_resets_everything() {
    let mut store = LayerStore::new();
    store.complete_layer(1);
    store.set_layer_data(2, Some(json!({"questions": 3})));
    store.fail_layer(3, Some("timeout".to_string()));
    store.reset();

    assert_eq!(store.current_layer(), 1);
    assert!(store.history().is_empty());
    for entry in store.layers() {
        assert_eq!(entry.status, LayerStatus::Pending);
        assert!(entry.data.is_none());
        assert!(entry.error.is_none());
    }
}

#[test]
fn it_fails_layers_with_a_message() {
    let mut store = LayerStore::new();
    store.fail_layer(3, Some("search index offline".to_string()));
    assert_eq!(store.status(3), Some(LayerStatus::Error));
    assert_eq!(store.get(3).unwrap().error.as_deref(), Some("search index offline"));

    store.complete_layer(3);
    assert!(store.get(3).unwrap().error.is_none());
}

#[test]
fn it_round_trips_snapshots() {
    let mut store = LayerStore::new();
    store.complete_layer(1);
    store.complete_layer(2);
    store.set_layer_data(3, Some(json!(["a", "b"])));

    let mut restored = LayerStore::new();
    restored.restore(&store.snapshot());
    assert_eq!(restored, store);
}
