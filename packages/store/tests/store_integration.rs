//! End-to-end tests against the real disk backend.

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shoebox_store::{Migration, ReadStore, Store, StoreConfig, StoreError, SCHEMA_VERSION_KEY};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Gadget {
    foo: String,
    bar: i64,
}

fn gadget(foo: &str, bar: i64) -> Gadget {
    Gadget {
        foo: foo.to_string(),
        bar,
    }
}

fn gadget_migrations() -> Vec<Migration> {
    vec![
        Box::new(|mut document| {
            document.insert("foo".to_string(), json!("hello"));
            document
        }),
        Box::new(|mut document| {
            document.insert("bar".to_string(), json!(0));
            document
        }),
    ]
}

fn disk_store(dir: &TempDir, config: StoreConfig) -> Store<Gadget> {
    Store::create(dir.path().join("gadgets"), config).unwrap()
}

#[test]
fn round_trips_items_through_real_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = disk_store(&dir, StoreConfig::new());

    store.put(&gadget("hello", 42), Some("fizzbuzz")).unwrap();

    // The record is a plain JSON file carrying the version tag.
    let raw = fs::read_to_string(dir.path().join("gadgets/fizzbuzz.json")).unwrap();
    let document: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(document[SCHEMA_VERSION_KEY], json!(0));
    assert_eq!(document["foo"], json!("hello"));

    assert_eq!(store.get("fizzbuzz").unwrap(), Some(gadget("hello", 42)));
    assert!(store.exists("fizzbuzz"));
    assert!(!store.exists("buzzfizz"));
}

#[test]
fn nested_keys_map_to_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = disk_store(&dir, StoreConfig::new());

    store.put(&gadget("deep", 1), Some("widgets/alpha")).unwrap();
    store.put(&gadget("flat", 2), Some("beta")).unwrap();

    assert!(dir.path().join("gadgets/widgets/alpha.json").is_file());

    let mut keys = store.get_all_keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["beta", "widgets/alpha"]);

    let mut entries = store.get_all_entries().unwrap();
    entries.sort_by(|left, right| left.0.cmp(&right.0));
    assert_eq!(entries[1], ("widgets/alpha".to_string(), gadget("deep", 1)));
}

#[test]
fn records_written_by_older_chains_upgrade_at_read_time() {
    let dir = tempfile::tempdir().unwrap();
    let directory = dir.path().join("gadgets");
    fs::create_dir_all(&directory).unwrap();

    // Records from three eras of the schema, as an older process would
    // have left them on disk.
    fs::write(directory.join("untagged.json"), "{}").unwrap();
    fs::write(
        directory.join("v1.json"),
        r#"{"__schema_version__": 1, "foo": "hey"}"#,
    )
    .unwrap();
    fs::write(
        directory.join("v3.json"),
        r#"{"__schema_version__": 3, "foo": "future", "bar": 9}"#,
    )
    .unwrap();

    let store: Store<Gadget> = Store::create(
        &directory,
        StoreConfig {
            migrations: gadget_migrations(),
            ..StoreConfig::new()
        },
    )
    .unwrap();

    assert_eq!(store.get("untagged").unwrap(), Some(gadget("hello", 0)));
    assert_eq!(store.get("v1").unwrap(), Some(gadget("hey", 0)));
    // Tagged beyond our chain: no migration applies.
    assert_eq!(store.get("v3").unwrap(), Some(gadget("future", 9)));

    // Re-writing stamps the current chain length; the upgrade sticks.
    let upgraded = store.get("untagged").unwrap().unwrap();
    store.put(&upgraded, Some("untagged")).unwrap();
    let raw = fs::read_to_string(directory.join("untagged.json")).unwrap();
    let document: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(document[SCHEMA_VERSION_KEY], json!(2));
}

#[test]
fn corrupt_files_raise_or_vanish_per_policy() {
    let dir = tempfile::tempdir().unwrap();
    let strict = disk_store(&dir, StoreConfig::new());
    strict.put(&gadget("good", 1), Some("good")).unwrap();
    fs::write(dir.path().join("gadgets/corrupt.json"), "{nope").unwrap();

    let error = strict.get("corrupt").unwrap_err();
    assert!(matches!(error, StoreError::Decode(_)));
    assert!(matches!(strict.get_all_items(), Err(StoreError::Decode(_))));

    let lenient: Store<Gadget> = Store::create(
        dir.path().join("gadgets"),
        StoreConfig {
            ignore_errors: true,
            ..StoreConfig::new()
        },
    )
    .unwrap();

    assert_eq!(lenient.get("corrupt").unwrap(), None);
    assert_eq!(lenient.get_all_items().unwrap(), vec![gadget("good", 1)]);
    // The corrupt file still exists; only its contents are unreadable.
    assert!(lenient.exists("corrupt"));
}

#[test]
fn hidden_and_foreign_files_are_invisible() {
    let dir = tempfile::tempdir().unwrap();
    let store = disk_store(&dir, StoreConfig::new());
    store.put(&gadget("only", 1), Some("only")).unwrap();

    fs::write(dir.path().join("gadgets/.hidden.json"), "{}").unwrap();
    fs::write(dir.path().join("gadgets/notes.txt"), "not a record").unwrap();

    assert_eq!(store.get_all_keys().unwrap(), vec!["only"]);
}

#[test]
fn primary_keyed_stores_derive_their_own_keys() {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Account {
        id: i64,
        owner: String,
    }

    let dir = tempfile::tempdir().unwrap();
    let store: Store<Account> = Store::create(
        dir.path().join("accounts"),
        StoreConfig {
            primary_key: Some("id".to_string()),
            ..StoreConfig::new()
        },
    )
    .unwrap();

    let account = Account {
        id: 101,
        owner: "ada".to_string(),
    };

    let key = store.put(&account, None).unwrap();
    assert_eq!(key.as_deref(), Some("101"));
    assert!(dir.path().join("accounts/101.json").is_file());
    assert_eq!(store.get("101").unwrap(), Some(account));
}

#[test]
#[should_panic(expected = "explicit key is required")]
fn writes_with_no_derivable_key_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let store = disk_store(&dir, StoreConfig::new());
    let _ = store.put(&gadget("x", 0), None);
}

#[test]
fn delete_and_delete_store_clean_up_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = disk_store(&dir, StoreConfig::new());
    store.put(&gadget("a", 1), Some("a")).unwrap();
    store.put(&gadget("b", 2), Some("nested/b")).unwrap();

    assert_eq!(store.delete("a").unwrap().as_deref(), Some("a"));
    assert!(!dir.path().join("gadgets/a.json").exists());
    assert_eq!(store.delete("a").unwrap(), None);

    store.delete_store().unwrap();
    assert!(!dir.path().join("gadgets").exists());
}

#[test]
fn ensure_survives_competing_initializers() {
    let dir = tempfile::tempdir().unwrap();
    let directory = dir.path().join("gadgets");
    let store = disk_store(&dir, StoreConfig::new());

    // Several threads race to initialize the same key; exactly one default
    // wins and every caller observes that same record.
    let results: Vec<Gadget> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                scope.spawn(move || store.ensure(gadget("default", n), Some("config")).unwrap())
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let on_disk: Store<Gadget> = Store::create(&directory, StoreConfig::new()).unwrap();
    let winner = on_disk.get("config").unwrap().unwrap();
    assert!(results.iter().all(|result| *result == winner));
}

#[test]
fn read_only_view_sees_writes_without_creating_anything() {
    let dir = tempfile::tempdir().unwrap();
    let store = disk_store(&dir, StoreConfig::new());
    store.put(&gadget("hello", 42), Some("fizz")).unwrap();

    let view: ReadStore<Gadget> = ReadStore::open(dir.path().join("gadgets"), StoreConfig::new());
    assert!(view.exists("fizz"));
    assert_eq!(view.get("fizz").unwrap(), Some(gadget("hello", 42)));
    assert_eq!(view.get_all_keys().unwrap(), vec!["fizz"]);

    // Opening a view of a directory that was never created leaves the
    // disk untouched and reads as empty.
    let absent: ReadStore<Gadget> =
        ReadStore::open(dir.path().join("never-created"), StoreConfig::new());
    assert!(absent.get_all_keys().unwrap().is_empty());
    assert!(!dir.path().join("never-created").exists());
}

#[cfg(feature = "async")]
#[tokio::test(flavor = "multi_thread")]
async fn async_store_round_trips_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Store<Gadget> = Store::create_async(dir.path().join("gadgets"), StoreConfig::new())
        .await
        .unwrap();

    store
        .put_async(gadget("hello", 42), Some("fizz"))
        .await
        .unwrap();

    assert!(store.exists_async("fizz").await);
    assert_eq!(
        store.get_async("fizz").await.unwrap(),
        Some(gadget("hello", 42))
    );

    store.put_async(gadget("b", 2), Some("buzz")).await.unwrap();
    let mut keys = store.get_all_keys_async().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["buzz", "fizz"]);

    let mut items = store.get_all_items_async().await.unwrap();
    items.sort_by(|left, right| left.bar.cmp(&right.bar));
    assert_eq!(items, vec![gadget("b", 2), gadget("hello", 42)]);

    store.delete_store_async().await.unwrap();
    assert!(!dir.path().join("gadgets").exists());
}

#[cfg(feature = "async")]
#[tokio::test(flavor = "multi_thread")]
async fn async_scan_propagates_the_failure_without_a_partial_list() {
    let dir = tempfile::tempdir().unwrap();
    let store: Store<Gadget> = Store::create_async(dir.path().join("gadgets"), StoreConfig::new())
        .await
        .unwrap();

    for n in 0..5 {
        let key = format!("ok-{n}");
        store
            .put_async(gadget("ok", n), Some(key.as_str()))
            .await
            .unwrap();
    }
    fs::write(dir.path().join("gadgets/corrupt.json"), "{nope").unwrap();

    let error = store.get_all_entries_async().await.unwrap_err();
    assert!(matches!(error, StoreError::Decode(_)));
}
