//! End-to-end sync against a mock remote: push a local quote, then fetch it
//! back with a server-assigned id and reconcile.

use pretty_assertions::assert_eq;
use quoteshelf::storage::{Database, Quote};
use quoteshelf::store::QuoteStore;
use quoteshelf::sync::{push_in_background, sync_once, RemoteClient, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn empty_store() -> QuoteStore {
    let db = Database::open(":memory:").await.unwrap();
    db.save_quotes(&[]).await.unwrap();
    QuoteStore::load(db).await.unwrap()
}

fn client_for(server: &MockServer) -> RemoteClient {
    RemoteClient::new(
        reqwest::Client::new(),
        &format!("{}/posts", server.uri()),
        "Server",
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_pushed_quote_reconciles_with_server_copy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id": 101}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"id": 1, "title": "From the server"},
                {"id": 101, "title": "Written locally", "category": "Mine"}
            ]"#,
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = empty_store().await;
    let added = store.add("Written locally", "Mine").await.unwrap();
    push_in_background(client.clone(), added).await.unwrap();

    let shared = Arc::new(Mutex::new(store));
    let report = sync_once(&shared, &client).await.unwrap();

    // Same content, so adopting the server id is not a conflict
    assert_eq!(report.conflicts, 0);
    assert_eq!(report.linked, 1);
    assert_eq!(report.added, 1);

    let guard = shared.lock().await;
    assert_eq!(
        guard.quotes(),
        &[
            Quote::with_id(101, "Written locally", "Mine"),
            Quote::with_id(1, "From the server", "Server"),
        ][..]
    );
}

#[tokio::test]
async fn test_second_sync_is_stable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"id": 1, "title": "A"}, {"id": 2, "title": "B"}]"#),
        )
        .mount(&server)
        .await;

    let shared = Arc::new(Mutex::new(empty_store().await));
    let client = client_for(&server);

    let first = sync_once(&shared, &client).await.unwrap();
    assert_eq!(first.added, 2);

    let second = sync_once(&shared, &client).await.unwrap();
    assert!(!second.changed());
    assert_eq!(second.unchanged, 2);
    assert_eq!(shared.lock().await.len(), 2);
}

#[tokio::test]
async fn test_unreachable_remote_degrades_to_local_only() {
    // Reserve a free port, then release it so connections are refused
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = RemoteClient::new(
        reqwest::Client::new(),
        &format!("http://{}/posts", addr),
        "Server",
        Duration::from_secs(5),
    )
    .unwrap();

    let mut store = empty_store().await;
    store.add("Offline", "Local").await.unwrap();
    let shared = Arc::new(Mutex::new(store));

    let err = sync_once(&shared, &client).await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)), "got {:?}", err);
    assert_eq!(
        shared.lock().await.quotes(),
        &[Quote::new("Offline", "Local")][..]
    );
}
