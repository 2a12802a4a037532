mod support;

use std::time::Duration;

use support::{init_logging, ScriptedBackend};
use taskdeck_engine::{spawn_poller, TaskStore};
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn refreshes_on_every_interval_until_cancelled() {
    init_logging();
    let backend = ScriptedBackend::new(Vec::new());
    let store = TaskStore::new(backend.clone());
    let token = CancellationToken::new();

    let poller = spawn_poller(store, Duration::from_secs(10), token.clone());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.list_calls(), 0);

    tokio::time::sleep(Duration::from_secs(26)).await;
    assert_eq!(backend.list_calls(), 3);

    token.cancel();
    poller.await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn stops_once_store_is_shut_down() {
    init_logging();
    let backend = ScriptedBackend::new(Vec::new());
    let store = TaskStore::new(backend.clone());

    let poller = spawn_poller(store.clone(), Duration::from_secs(10), CancellationToken::new());
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(backend.list_calls(), 1);

    store.shutdown();
    tokio::time::sleep(Duration::from_secs(10)).await;
    poller.await.unwrap();
    assert_eq!(backend.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_raised_to_one_second() {
    init_logging();
    let backend = ScriptedBackend::new(Vec::new());
    let store = TaskStore::new(backend.clone());
    let token = CancellationToken::new();

    let poller = spawn_poller(store, Duration::ZERO, token.clone());
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.list_calls(), 0);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(backend.list_calls(), 1);

    token.cancel();
    poller.await.unwrap();
}
