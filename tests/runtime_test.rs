use async_trait::async_trait;
use dockdb::backend::{Backend, ContainerAction};
use dockdb::storage::{KeyValueStore, MemoryStore};
use dockdb::{ClientRuntime, Error, Result, RuntimeConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Backend double that records every command and serves canned lists.
#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<String>>,
    status: Mutex<String>,
    port: Mutex<String>,
    failing: AtomicBool,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        let backend = Self::default();
        *backend.status.lock() = "running".to_string();
        *backend.port.lock() = "5432".to_string();
        Arc::new(backend)
    }

    fn count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value> {
        self.calls.lock().push(command.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::backend(command, "Docker daemon not reachable"));
        }
        match command {
            "list_containers" => Ok(json!([{
                "id": "c1",
                "name": "orders-db",
                "status": *self.status.lock(),
                "port": *self.port.lock(),
                "created": "2024-05-01 10:00",
                "database_name": "orders",
                "db_type": "postgres"
            }])),
            "list_images" => Ok(json!([
                { "id": "sha256:1", "tags": ["postgres:16"], "size": 400 },
                { "id": "sha256:2", "tags": ["redis:7"], "size": 100 }
            ])),
            "get_database_types" => Ok(json!([{ "id": "postgres" }, { "id": "mysql" }])),
            "stop_container" => {
                assert_eq!(args["containerId"], "c1");
                *self.status.lock() = "exited".to_string();
                Ok(Value::Null)
            }
            other => Err(Error::backend(other, "unsupported")),
        }
    }
}

fn runtime(backend: &Arc<FakeBackend>) -> ClientRuntime {
    let shared: Arc<dyn Backend> = backend.clone();
    ClientRuntime::new(RuntimeConfig::default(), shared, None).unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_start_loads_containers_only() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    runtime.start();
    settle().await;

    assert_eq!(runtime.state().containers().len(), 1);
    assert_eq!(backend.count("list_containers"), 1);
    assert_eq!(backend.count("list_images"), 0);
    assert!(runtime.state().get_snapshot().tauri["connected"].as_bool().unwrap());

    let stats = runtime.polling().stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 2);

    runtime.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_container_port_sent_as_string() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    assert_eq!(runtime.refresh_containers().await.unwrap(), 1);
    assert_eq!(runtime.state().containers()[0].port, Some(5432));

    *backend.port.lock() = String::new();
    runtime.cache().invalidate("containers");
    assert_eq!(runtime.refresh_containers().await.unwrap(), 1);
    assert_eq!(runtime.state().containers()[0].port, None);
}

#[tokio::test(start_paused = true)]
async fn test_start_follows_persisted_tab() {
    let storage = MemoryStore::new();
    storage
        .set_item("docker-db-manager.ui.activeTab", "\"images\"")
        .unwrap();
    let mut config = RuntimeConfig::default();
    config.state.persisted_keys = vec!["ui.activeTab".to_string()];

    let backend = FakeBackend::new();
    let shared: Arc<dyn Backend> = backend.clone();
    let runtime = ClientRuntime::new(config, shared, Some(Arc::new(storage))).unwrap();
    assert_eq!(runtime.state().active_tab(), "images");

    runtime.start();
    settle().await;
    assert_eq!(runtime.polling().active_tab().as_deref(), Some("images"));
    assert_eq!(backend.count("list_images"), 1);
    assert_eq!(runtime.state().images().len(), 2);

    tokio::time::sleep(Duration::from_millis(30_500)).await;
    assert_eq!(backend.count("list_images"), 2);

    runtime.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_images_tab_triggers_image_refresh() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    runtime.start();
    settle().await;

    runtime.set_active_tab("images");
    settle().await;

    assert_eq!(runtime.state().active_tab(), "images");
    assert_eq!(runtime.state().images().len(), 2);
    assert_eq!(backend.count("list_images"), 1);

    runtime.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_container_polling_refetches_every_interval() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    runtime.start();

    tokio::time::sleep(Duration::from_millis(20_500)).await;
    assert_eq!(backend.count("list_containers"), 3);

    runtime.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_container_action_refreshes_list() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    assert_eq!(runtime.refresh_containers().await.unwrap(), 1);

    runtime
        .container_action(ContainerAction::Stop, "c1")
        .await
        .unwrap();

    assert_eq!(backend.count("stop_container"), 1);
    assert_eq!(backend.count("list_containers"), 2);
    assert_eq!(runtime.state().containers()[0].status, "exited");
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_serves_last_good_list() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    runtime.refresh_containers().await.unwrap();

    backend.failing.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(runtime.refresh_containers().await.unwrap(), 1);
    assert_eq!(backend.count("list_containers"), 2);
    assert_eq!(runtime.state().containers()[0].name, "orders-db");
}

#[tokio::test(start_paused = true)]
async fn test_cold_failure_propagates() {
    let backend = FakeBackend::new();
    backend.failing.store(true, Ordering::SeqCst);
    let runtime = runtime(&backend);

    let err = runtime.refresh_images().await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert!(runtime.state().images().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_database_types_are_cached() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);

    assert_eq!(runtime.load_database_types().await.unwrap().len(), 2);
    assert_eq!(runtime.load_database_types().await.unwrap().len(), 2);
    assert_eq!(backend.count("get_database_types"), 1);
    assert_eq!(
        runtime.state().get_data("databaseTypes").unwrap()[1]["id"],
        "mysql"
    );
}

#[tokio::test(start_paused = true)]
async fn test_hidden_window_stops_polling() {
    let backend = FakeBackend::new();
    let runtime = runtime(&backend);
    runtime.start();
    settle().await;

    runtime.set_visible(false);
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(backend.count("list_containers"), 1);

    runtime.set_visible(true);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.count("list_containers"), 2);

    runtime.shutdown();
}
