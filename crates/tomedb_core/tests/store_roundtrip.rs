//! End-to-end persistence tests through real files.

use serde_json::json;
use tomedb_core::Record;
use tomedb_storage::TEMP_SUFFIX;
use tomedb_testkit::prelude::*;

/// Lists leftover temp-file names next to the store document.
fn temp_entries(store: &TestStore) -> Vec<String> {
    let dir = store.path().parent().expect("store path has a parent");
    std::fs::read_dir(dir)
        .expect("read store directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(TEMP_SUFFIX))
        .collect()
}

#[tokio::test]
async fn records_round_trip_across_collections() {
    let store = TestStore::new().await;

    let users = store.collection("users");
    users
        .store(Record::new().with("name", "ada").with("admin", true))
        .await
        .unwrap();
    users
        .store(Record::new().with("name", "grace").with("teams", json!(["a", "b"])))
        .await
        .unwrap();

    let posts = store.collection("posts");
    posts
        .store(Record::new().with("title", "hello").with("author", 1u64))
        .await
        .unwrap();

    let reloaded = store.reload().await.unwrap();
    assert_eq!(reloaded.collection_names(), vec!["posts", "users"]);

    let users = reloaded.collection("users");
    let ada = users.get(1u64).unwrap();
    assert_eq!(ada.get("name"), Some(&json!("ada")));
    assert_eq!(ada.get("admin"), Some(&json!(true)));
    let grace = users.get(2u64).unwrap();
    assert_eq!(grace.get("teams"), Some(&json!(["a", "b"])));

    let post = reloaded.collection("posts").get(1u64).unwrap();
    assert_eq!(post.get("title"), Some(&json!("hello")));
}

#[tokio::test]
async fn deletes_and_updates_survive_a_reload() {
    let store = scenarios::populated("nums", 5).await;
    let nums = store.collection("nums");

    nums.delete(2u64).await.unwrap();
    nums.update_by_id(&Record::new().with("flagged", true), 4u64)
        .await
        .unwrap();

    let reloaded = store.reload().await.unwrap();
    let nums = reloaded.collection("nums");
    assert_eq!(nums.len(), 4);
    assert!(nums.get(2u64).is_none());
    assert_eq!(nums.get(4u64).unwrap().get("flagged"), Some(&json!(true)));
}

#[tokio::test]
async fn empty_collection_persists_once_saved() {
    let store = TestStore::new().await;
    store.collection("drafts");
    store.save().await.unwrap();

    let reloaded = store.reload().await.unwrap();
    assert_eq!(reloaded.collection_names(), vec!["drafts"]);
    assert!(reloaded.collection("drafts").is_empty());
}

#[tokio::test]
async fn no_temp_files_after_mixed_workload() {
    let store = TestStore::new().await;
    let items = store.collection("items");

    for n in 0..10u64 {
        items.store(Record::new().with("n", n)).await.unwrap();
    }
    items.delete_many(&[3u64.into(), 7u64.into()]).await.unwrap();
    items
        .update(&Record::new().with("seen", true), |r| {
            r.get("n").and_then(|v| v.as_u64()).is_some_and(|n| n < 5)
        })
        .await
        .unwrap();

    let leftovers = temp_entries(&store);
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");

    let reloaded = store.reload().await.unwrap();
    assert_eq!(reloaded.collection("items").len(), 8);
}

#[tokio::test]
async fn reload_preserves_insertion_order() {
    let store = TestStore::new().await;
    let items = store.collection("items");

    items.store(Record::new().with("n", 1u64)).await.unwrap();
    items.store(Record::new().with("n", 2u64)).await.unwrap();
    // Replacing the first record moves it to the end.
    items
        .store(Record::new().with("id", 1u64).with("n", 10u64))
        .await
        .unwrap();

    let reloaded = store.reload().await.unwrap();
    let listed = reloaded.collection("items").list();
    let ns: Vec<_> = listed
        .iter()
        .map(|r| r.get("n").and_then(|v| v.as_u64()).unwrap())
        .collect();
    assert_eq!(ns, vec![2, 10]);
}

mod generated {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Any generated batch survives a save and reload field for field.
        #[test]
        fn generated_batches_round_trip(
            name in collection_name_strategy(),
            batch in record_batch_strategy(),
        ) {
            let runtime = tokio::runtime::Runtime::new().expect("build runtime");
            runtime.block_on(async {
                let store = TestStore::new().await;
                let stored = store
                    .collection(&name)
                    .store_many(batch.clone())
                    .await
                    .unwrap();

                let reloaded = store.reload().await.unwrap();
                let listed = reloaded.collection(&name).list();
                assert_eq!(listed.len(), batch.len());
                for (input, kept) in batch.iter().zip(&listed) {
                    for (field, value) in input.fields() {
                        assert_eq!(kept.get(field), Some(value));
                    }
                }
                for (kept, original) in listed.iter().zip(&stored) {
                    assert_eq!(kept.id(), original.id());
                }
            });
        }
    }
}
