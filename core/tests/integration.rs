//! End-to-end tests against the live mock sheet server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Dispatcher::call`
//! over real HTTP through `UreqTransport`, with sessions coming from a
//! `SessionProvider` backed by a `FileStore`.

use std::sync::Arc;

use rider_sync::{
    normalize_rut, AuthorizationTable, DispatchError, Dispatcher, FileStore, KeyValueStore,
    MemoryStore, NoSession, Role, SessionProvider, UreqTransport,
};
use serde_json::json;

const TABLE: &str = r#"{
    "passphrase": "Buses2026",
    "users": [
        {"email": "digita@liceo.cl", "role": "digitador"},
        {"email": "jefa@liceo.cl", "role": "admin"}
    ]
}"#;

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(sheet_mock_server::run(listener));
    format!("http://{addr}/")
}

#[tokio::test(flavor = "multi_thread")]
async fn rider_lifecycle_over_http() {
    // Step 1: start mock server and sign in.
    let url = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path().join("local.json")));
    let sessions = Arc::new(SessionProvider::new(
        store.clone(),
        AuthorizationTable::from_json(TABLE).unwrap(),
    ));
    sessions.login("Digita@liceo.cl", "Buses2026").unwrap();
    assert!(sessions.require_role(&[Role::Digitador]).is_ok());

    let dispatcher = Dispatcher::new(store, sessions.clone(), Arc::new(UreqTransport::new()));

    // Step 2: unconfigured — nothing is sent.
    let err = dispatcher.call("ping", None).await.unwrap_err();
    assert!(matches!(err, DispatchError::Configuration));

    // Step 3: configure and ping; the session email travels in the envelope.
    dispatcher.configure(&url, "test-key").unwrap();
    let pong = dispatcher.call("ping", None).await.unwrap();
    assert_eq!(pong, json!({"pong": true, "email": "digita@liceo.cl"}));

    // Step 4: save a rider using a normalized RUT.
    let rut = normalize_rut("12.345.678 5");
    let saved = dispatcher
        .call("saveStudent", Some(json!({"rut": rut, "name": "Ana Rojas", "bus": "B1"})))
        .await
        .unwrap();
    assert_eq!(saved["rut"], "12345678-5");
    assert_eq!(saved["updatedBy"], "digita@liceo.cl");

    // Step 5: fetch it back through the legacy alias and nested payload.
    let fetched = dispatcher
        .call("getStudentByRut", Some(json!({"payload": {"rut": "12345678-5"}})))
        .await
        .unwrap();
    assert_eq!(fetched, saved);

    // Step 6: list buses through the legacy alias.
    let buses = dispatcher.call("listBusesWithLoad", None).await.unwrap();
    assert_eq!(buses[0]["id"], "B1");
    assert_eq!(buses[0]["load"], 1);

    // Step 7: server-side refusal surfaces as an application error.
    let err = dispatcher
        .call("saveStudent", Some(json!({"rut": "1-9"})))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Application(_)));
    assert_eq!(err.to_string(), "rut and name are required");

    // Step 8: after logout the email falls back to empty.
    sessions.logout().unwrap();
    let pong = dispatcher.call("ping", None).await.unwrap();
    assert_eq!(pong["email"], "");
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_key_is_application_error() {
    let url = start_server().await;
    let dispatcher = Dispatcher::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoSession),
        Arc::new(UreqTransport::new()),
    );
    dispatcher.configure(&url, "wrong").unwrap();

    let err = dispatcher.call("ping", None).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid api key");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_endpoint_is_transport_error() {
    // Reserve a port, then free it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dispatcher = Dispatcher::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoSession),
        Arc::new(UreqTransport::new()),
    );
    dispatcher.configure(&format!("http://{addr}/"), "test-key").unwrap();

    let err = dispatcher.call("ping", None).await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)), "{err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_calls_are_independent() {
    let url = start_server().await;
    let dispatcher = Dispatcher::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoSession),
        Arc::new(UreqTransport::new()),
    );
    dispatcher.configure(&url, "test-key").unwrap();

    let calls = (0..4).map(|i| {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .call("ping", Some(json!({"email": format!("op{i}@liceo.cl")})))
                .await
        })
    });
    for (i, handle) in calls.collect::<Vec<_>>().into_iter().enumerate() {
        let pong = handle.await.unwrap().unwrap();
        assert_eq!(pong["email"], format!("op{i}@liceo.cl"));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn large_envelope_is_read_in_full() {
    // 12 MB of data, past ureq's default body cap.
    let blob_len = 12 * 1024 * 1024;
    let body = json!({"ok": true, "data": "x".repeat(blob_len)}).to_string();
    let router = axum::Router::new().route("/", axum::routing::post(move || async move { body }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let dispatcher = Dispatcher::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoSession),
        Arc::new(UreqTransport::new()),
    );
    dispatcher.configure(&format!("http://{addr}/"), "test-key").unwrap();

    let data = dispatcher.call("ping", None).await.unwrap();
    assert_eq!(data.as_str().map(str::len), Some(blob_len));
}
