//! End-to-end tests: the router served on a loopback port, driven over HTTP
//! and through the registry coordinator.

use std::net::SocketAddr;

use cvetrack_client::{HttpStore, HttpStoreConfig};
use cvetrack_core::{
    NewRecord, Refresh, Registry, RegistryError, Rejection, RemoteStore, Severity, SqliteCache, Status, SyncMode,
    SyncWarning, TableStore,
};
use cvetrack_server::{AppState, run};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn_server() -> SocketAddr {
    let store = TableStore::open_in_memory().await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run(listener, AppState::new(store), std::future::pending()));
    addr
}

fn http_store(addr: SocketAddr) -> HttpStore {
    HttpStore::new(HttpStoreConfig { base_url: format!("http://{addr}"), ..Default::default() }).unwrap()
}

async fn registry_for(addr: SocketAddr) -> Registry<HttpStore, SqliteCache> {
    let cache = SqliteCache::open_in_memory().await.unwrap();
    Registry::new(http_store(addr), cache)
}

#[tokio::test]
async fn test_healthz() {
    let addr = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({ "ok": true }));
}

#[tokio::test]
async fn test_http_status_codes() {
    let addr = spawn_server().await;
    let http = reqwest::Client::new();
    let cves = format!("http://{addr}/api/cves");

    let created = http
        .post(&cves)
        .json(&json!({ "id": "CVE-2024-0001", "description": "heap overflow" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await.unwrap();
    assert_eq!(body["severity"], "Unknown");
    assert_eq!(body["status"], "Open");
    assert!(body["dateAdded"].is_string());

    let missing = http.post(&cves).json(&json!({ "id": "CVE-2024-0002" })).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("description"));

    let garbage = http
        .post(&cves)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);

    let listed = http.get(&cves).send().await.unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(listed.json::<Vec<Value>>().await.unwrap().len(), 1);

    let patched = http
        .patch(format!("{cves}/CVE-2024-0001/status"))
        .json(&json!({ "status": "In Progress" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patched.status(), StatusCode::OK);
    assert_eq!(patched.json::<Value>().await.unwrap()["status"], "In Progress");

    let absent = http
        .patch(format!("{cves}/CVE-0000-0000/status"))
        .json(&json!({ "status": "Resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(absent.status(), StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let deleted = http.delete(format!("{cves}/CVE-2024-0001")).send().await.unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);
        assert_eq!(deleted.json::<Value>().await.unwrap()["message"], "CVE deleted successfully");
    }
}

#[tokio::test]
async fn test_coordinator_add_duplicate_delete_scenario() {
    let addr = spawn_server().await;
    let observer = http_store(addr);
    let registry = registry_for(addr).await;

    let loaded = registry.start().await;
    assert_eq!(loaded.value, 0);
    assert_eq!(loaded.mode, SyncMode::Synced);

    let added = registry.add(NewRecord::new("CVE-1", "x")).await.unwrap();
    assert_eq!(added.mode, SyncMode::Synced);
    assert!(added.warnings.is_empty());

    let listed = observer.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].severity, Severity::Unknown);
    assert_eq!(listed[0].status, Status::Open);

    let duplicate = registry.add(NewRecord::new("CVE-1", "y")).await;
    assert_eq!(duplicate, Err(RegistryError::Rejected(Rejection::DuplicateId("CVE-1".into()))));
    let records = registry.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].description, "x");
    assert_eq!(observer.list_all().await.unwrap()[0].description, "x");

    let deleted = registry.delete("CVE-1").await.unwrap();
    assert!(deleted.value.is_some());
    assert!(observer.list_all().await.unwrap().is_empty());

    let again = registry.delete("CVE-1").await.unwrap();
    assert!(again.value.is_none());
    assert_eq!(again.mode, SyncMode::Synced);
    assert!(again.warnings.is_empty());
}

#[tokio::test]
async fn test_coordinator_status_and_refresh() {
    let addr = spawn_server().await;
    let observer = http_store(addr);
    let registry = registry_for(addr).await;
    registry.start().await;

    registry.add(NewRecord::new("CVE-7", "auth bypass")).await.unwrap();
    let updated = registry.update_status("CVE-7", Status::Mitigated).await.unwrap();
    assert_eq!(updated.mode, SyncMode::Synced);
    assert_eq!(observer.list_all().await.unwrap()[0].status, Status::Mitigated);

    let elsewhere = NewRecord { severity: Some(Severity::Critical), ..NewRecord::new("CVE-8", "rce") };
    let other = registry_for(addr).await;
    other.start().await;
    other.add(elsewhere).await.unwrap();

    let refreshed = registry.refresh().await.unwrap();
    assert_eq!(refreshed.value, Refresh::Adopted { count: 2 });
    let critical = registry.records().await.into_iter().find(|r| r.id == "CVE-8").unwrap();
    assert_eq!(critical.severity, Severity::Critical);
}

#[tokio::test]
async fn test_coordinator_degrades_without_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let registry = registry_for(addr).await;
    let loaded = registry.start().await;
    assert_eq!(loaded.mode, SyncMode::Degraded);
    assert!(matches!(loaded.warnings.as_slice(), [SyncWarning::Remote { .. }]));

    let added = registry.add(NewRecord::new("CVE-9", "offline edit")).await.unwrap();
    assert!(added.is_degraded());
    assert_eq!(registry.records().await.len(), 1);
    assert_eq!(registry.mode().await, SyncMode::Degraded);
}
