use dockdb::state::{AppState, ContainerInfo, StatePath, UiKey};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Subscribe a listener that records every value it receives.
fn record(state: &AppState, path: &str) -> (Arc<Mutex<Vec<Value>>>, dockdb::Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = state.subscribe(path, move |value| sink.lock().push(value.clone()));
    (seen, sub)
}

fn container(id: &str) -> ContainerInfo {
    ContainerInfo {
        id: id.to_string(),
        name: format!("{}-db", id),
        status: "running".to_string(),
        port: Some(5432),
        created: "2024-05-01T10:00:00Z".to_string(),
        database_name: "app".to_string(),
        db_type: Some("postgres".to_string()),
    }
}

#[test]
fn test_unknown_key_is_rejected_silently() {
    let state = AppState::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut subs = Vec::new();
    for path in ["ui.foo", "data.foo", "modal.foo", "monitoring.foo", "migration.foo"] {
        let calls = Arc::clone(&calls);
        subs.push(state.subscribe(path, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        }));
    }
    let before = state.get_snapshot();

    assert!(!state.set_ui("foo", 1, false));
    assert!(!state.set_data("foo", 1, true));
    assert!(!state.set_modal("foo", 1));
    assert!(!state.set_monitoring("foo", 1));
    assert!(!state.set_migration("foo", 1));
    assert!(!state.set_path("ui.foo", 1));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.get_ui("foo"), None);
    let after = state.get_snapshot();
    assert_eq!(
        serde_json::to_value(&before).unwrap(),
        serde_json::to_value(&after).unwrap()
    );
}

#[test]
fn test_write_notifies_exact_path_with_value() {
    let state = AppState::new();
    let (tab, _sub_tab) = record(&state, "ui.activeTab");
    let (other, _sub_other) = record(&state, "ui.selectedDbType");

    state.set_ui("activeTab", "compose", false);
    state.set_data("allContainers", vec![container("a"), container("b")], false);

    assert_eq!(*tab.lock(), vec![json!("compose")]);
    assert!(other.lock().is_empty());
    assert_eq!(state.containers().len(), 2);
    assert_eq!(state.stats().containers, 2);
}

#[test]
fn test_monitoring_history_cap() {
    let state = AppState::new();
    let (updates, _sub) = record(&state, "monitoring.cpuHistory");

    for i in 0..40 {
        state.add_cpu_sample(i as f64);
        state.add_memory_sample(i as f64 * 2.0);
    }

    let cpu = state.get_monitoring("cpuHistory").unwrap();
    let cpu = cpu.as_array().unwrap();
    assert_eq!(cpu.len(), 30);
    assert_eq!(cpu[0], json!(10.0));
    assert_eq!(cpu[29], json!(39.0));
    assert_eq!(state.stats().memory_history_points, 30);
    assert_eq!(updates.lock().len(), 40);

    let (cleared, _sub_cleared) = record(&state, "monitoring.history.cleared");
    state.clear_monitoring_history();
    assert_eq!(state.stats().cpu_history_points, 0);
    assert_eq!(*cleared.lock(), vec![json!(true)]);
}

#[test]
fn test_undo_redo_round_trip() {
    let state = AppState::new();
    state.enable_history();
    let (undo_events, _u) = record(&state, "history.undo");
    let (redo_events, _r) = record(&state, "history.redo");
    let (restored, _s) = record(&state, "state.restored");

    state.set_ui("activeTab", "A", true);
    state.set_ui("activeTab", "B", true);
    assert_eq!(state.active_tab(), "B");

    assert!(state.undo());
    assert_eq!(state.active_tab(), "A");
    let info = state.history_info();
    assert!(info.can_redo);
    assert_eq!(info.future_length, 1);

    assert!(state.redo());
    assert_eq!(state.active_tab(), "B");
    assert!(!state.redo());

    assert_eq!(undo_events.lock().len(), 1);
    assert_eq!(redo_events.lock().len(), 1);
    assert_eq!(restored.lock().len(), 2);
    assert_eq!(undo_events.lock()[0]["ui"]["activeTab"], json!("A"));
}

#[test]
fn test_undo_on_empty_history_returns_false() {
    let state = AppState::new();
    state.enable_history();
    assert!(!state.undo());

    state.set_ui("activeTab", "images", true);
    assert!(state.undo());
    assert_eq!(state.active_tab(), "dashboard");
    assert!(!state.undo());
}

#[test]
fn test_new_write_clears_redo() {
    let state = AppState::new();
    state.enable_history();
    state.set_ui("activeTab", "A", true);
    state.set_ui("activeTab", "B", true);
    state.undo();

    state.set_ui("activeTab", "C", true);
    assert!(!state.history_info().can_redo);
    assert!(!state.redo());
}

#[test]
fn test_failing_listener_does_not_affect_others() {
    let state = AppState::new();
    let (first, _a) = record(&state, "data.allImages");
    let _boom = state.subscribe("data.allImages", |_| panic!("listener exploded"));
    let (third, _c) = record(&state, "data.allImages");

    let images = json!([{ "id": "sha256:abc", "tags": ["postgres:16"], "size": 1024 }]);
    assert!(state.set_data("allImages", images.clone(), false));

    assert_eq!(*first.lock(), vec![images.clone()]);
    assert_eq!(*third.lock(), vec![images]);
    assert_eq!(state.images()[0].tags, vec!["postgres:16".to_string()]);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let state = AppState::new();
    let (seen, sub) = record(&state, "ui.currentChartType");

    state.set_ui("currentChartType", "bar", false);
    assert!(sub.unsubscribe());
    state.set_ui("currentChartType", "area", false);

    assert_eq!(*seen.lock(), vec![json!("bar")]);
    assert!(state.stats().active_listeners.is_empty());
}

#[test]
fn test_listeners_called_in_subscription_order() {
    let state = AppState::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut subs = Vec::new();
    for n in 0..5 {
        let order = Arc::clone(&order);
        subs.push(state.subscribe("migration.localPostgresConfig", move |_| order.lock().push(n)));
    }

    state.set_migration("localPostgresConfig", json!({ "host": "localhost", "port": 5432 }));
    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_reset_restores_defaults_and_empties_history() {
    let state = AppState::new();
    state.enable_history();
    let (resets, _sub) = record(&state, "reset");

    state.set_ui("activeTab", "volumes", true);
    state.set_data("allContainers", vec![container("x")], true);
    state.set_modal("currentSQL", json!({ "containerId": "x" }));
    state.add_cpu_sample(12.5);

    state.reset();

    assert_eq!(state.active_tab(), "dashboard");
    assert_eq!(state.get_ui("currentChartType"), Some(json!("line")));
    assert!(state.containers().is_empty());
    assert_eq!(state.get_modal("currentSQL"), Some(Value::Null));
    assert_eq!(state.stats().cpu_history_points, 0);

    let info = state.history_info();
    assert_eq!(info.past_length, 0);
    assert_eq!(info.future_length, 0);
    assert!(info.enabled);
    assert_eq!(*resets.lock(), vec![json!(true)]);
}

#[test]
fn test_snapshot_redacts_handles() {
    let state = AppState::new();
    state.set_monitoring("cpuChart", "chart-42");
    state.set_monitoring("interval", "timer-7");

    let snapshot = serde_json::to_value(state.get_snapshot()).unwrap();
    assert_eq!(snapshot["monitoring"]["cpuChart"], json!("initialized"));
    assert_eq!(snapshot["monitoring"]["memoryChart"], Value::Null);
    assert_eq!(snapshot["tauri"]["invoke"], Value::Null);
    assert_eq!(snapshot["tauri"]["connected"], json!(false));
    assert!(snapshot["modals"].get("currentSQL").is_some());
}

#[test]
fn test_typed_path_api() {
    let state = AppState::new();
    let path = StatePath::Ui(UiKey::SelectedDbType);
    assert!(state.set(path, "mysql", false));
    assert_eq!(state.get(path), Some(json!("mysql")));
    assert_eq!(state.get_path("ui.selectedDbType"), Some(json!("mysql")));
    assert_eq!(state.get_path("ui.unknown"), None);
}
