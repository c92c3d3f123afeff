//! Scheduling tests for the coalesced save path.
//!
//! These tests drive store futures by hand: the first poll of a mutating
//! call applies its change and enrolls it with the save scheduler, so
//! polling a batch once each puts every change in place before any
//! write is allowed to finish. No timing assumptions are needed.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use tomedb_core::{Config, CoreError, Database, Record};
use tomedb_testkit::prelude::*;

/// Polls a future exactly once.
async fn poll_once<F: Future>(mut future: Pin<&mut F>) -> Poll<F::Output> {
    std::future::poll_fn(move |cx| Poll::Ready(future.as_mut().poll(cx))).await
}

#[tokio::test]
async fn saves_issued_during_a_write_coalesce_into_one_follow_up() {
    let backend = Arc::new(GatedBackend::new());
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();
    let items = db.collection("items");

    let mut stores = Vec::new();
    for n in 0..6u64 {
        stores.push(Box::pin(items.store(Record::new().with("n", n))));
    }
    for store in &mut stores {
        assert!(poll_once(store.as_mut()).await.is_pending());
    }

    backend.release_all();
    for store in stores {
        store.await.unwrap();
    }

    assert_eq!(backend.started(), 2, "one in-flight write plus one follow-up");
    assert_eq!(backend.finished(), 2);

    let document: serde_json::Value =
        serde_json::from_slice(&backend.document().unwrap()).unwrap();
    assert_eq!(document["items"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn sequential_saves_write_every_time() {
    let backend = Arc::new(CountingBackend::new());
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();
    let items = db.collection("items");

    for n in 0..3u64 {
        items.store(Record::new().with("n", n)).await.unwrap();
    }

    assert_eq!(backend.writes(), 3, "idle saves must not be deferred");
}

#[tokio::test]
async fn batch_operations_schedule_a_single_write() {
    let backend = Arc::new(CountingBackend::new());
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();
    let items = db.collection("items");

    items
        .store_many(vec![
            Record::new().with("n", 1u64),
            Record::new().with("n", 2u64),
            Record::new().with("n", 3u64),
        ])
        .await
        .unwrap();
    assert_eq!(backend.writes(), 1);

    items.delete_many(&[]).await.unwrap();
    assert_eq!(backend.writes(), 1, "an empty delete batch writes nothing");

    // An empty store batch still persists the current snapshot.
    items.store_many(vec![]).await.unwrap();
    assert_eq!(backend.writes(), 2);
}

#[tokio::test]
async fn failed_write_reports_and_the_next_save_recovers() {
    let backend = Arc::new(FailingBackend::failing(1));
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();
    let items = db.collection("items");

    let result = items.store(Record::new().with("n", 1u64)).await;
    assert!(matches!(result, Err(CoreError::Io(_))));
    // The in-memory change stays; only persistence failed.
    assert_eq!(items.len(), 1);

    db.save().await.unwrap();
    assert_eq!(backend.attempts(), 2);

    let document: serde_json::Value =
        serde_json::from_slice(&backend.document().unwrap()).unwrap();
    assert_eq!(document["items"][0]["n"], 1);
}

#[tokio::test]
async fn coalesced_savers_share_the_follow_up_write_outcome() {
    let backend = Arc::new(FailingBackend::failing(2));
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();
    let items = db.collection("items");

    let mut stores = Vec::new();
    for n in 0..3u64 {
        stores.push(Box::pin(items.store(Record::new().with("n", n))));
    }
    for store in &mut stores {
        assert!(poll_once(store.as_mut()).await.is_pending());
    }

    // First write fails for the first saver; the follow-up write fails
    // for both coalesced savers, which see the same error.
    let mut outcomes = Vec::new();
    for store in stores {
        outcomes.push(store.await);
    }
    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, Err(CoreError::Io(_)))));
    assert_eq!(backend.attempts(), 2);

    // The machine is not wedged: the next save succeeds and persists
    // every change from the failed rounds.
    db.save().await.unwrap();
    assert_eq!(backend.attempts(), 3);

    let document: serde_json::Value =
        serde_json::from_slice(&backend.document().unwrap()).unwrap();
    assert_eq!(document["items"].as_array().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_all_settle_durably() {
    let backend = Arc::new(CountingBackend::new());
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();
    let items = db.collection("items");

    let mut tasks = Vec::new();
    for task in 0..8u64 {
        let items = items.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..4u64 {
                items
                    .store(Record::new().with("task", task).with("n", n))
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(items.len(), 32);
    let mut ids: Vec<_> = items.list().iter().map(|r| r.id().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 32, "allocated ids must be unique");

    // Every store resolved, so the last write covers all of them.
    let document: serde_json::Value =
        serde_json::from_slice(&backend.document().unwrap()).unwrap();
    assert_eq!(document["items"].as_array().unwrap().len(), 32);
    assert!(backend.writes() <= 32);
}

#[tokio::test]
async fn interleaved_collections_land_in_one_snapshot() {
    let backend = Arc::new(GatedBackend::new());
    let db = Database::with_backend(backend.clone(), Config::default()).unwrap();

    let a = db.collection("a");
    let b = db.collection("b");
    let mut first = Box::pin(a.store(Record::new().with("n", 1u64)));
    let mut second = Box::pin(b.store(Record::new().with("n", 2u64)));
    assert!(poll_once(first.as_mut()).await.is_pending());
    assert!(poll_once(second.as_mut()).await.is_pending());

    backend.release_all();
    first.await.unwrap();
    second.await.unwrap();

    let document: serde_json::Value =
        serde_json::from_slice(&backend.document().unwrap()).unwrap();
    assert_eq!(document["a"].as_array().unwrap().len(), 1);
    assert_eq!(document["b"].as_array().unwrap().len(), 1);
}
