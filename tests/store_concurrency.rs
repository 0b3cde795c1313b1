//! Race tests for the file-backed store.
//!
//! Many tasks on a multi-threaded runtime save distinct secrets, then two
//! consumers race for every id. Each secret must be handed out exactly once
//! and the file must end up empty.

use std::collections::HashSet;
use std::sync::Arc;

use secretdrop::store::{Digest, FileStore, SecretStore};

const SECRETS: usize = 64;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_saves_and_racing_consumes_hand_out_each_secret_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    let store = Arc::new(FileStore::open(&path, Digest::Md5).await.unwrap());

    let mut saves = Vec::new();
    for i in 0..SECRETS {
        let store = store.clone();
        saves.push(tokio::spawn(async move {
            let plain = format!("secret-{}", i);
            let id = store.save(&plain).await.unwrap();
            (id, plain)
        }));
    }
    let mut saved = Vec::new();
    for handle in saves {
        saved.push(handle.await.unwrap());
    }

    let distinct: HashSet<&String> = saved.iter().map(|(id, _)| id).collect();
    assert_eq!(distinct.len(), SECRETS);

    // Every save must be visible on disk before any consume starts.
    let on_disk: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk.len(), SECRETS);

    let mut consumes = Vec::new();
    for (id, _) in &saved {
        for _ in 0..2 {
            let store = store.clone();
            let id = id.clone();
            consumes.push(tokio::spawn(async move {
                let value = store.consume(&id).await.unwrap();
                (id, value)
            }));
        }
    }

    let mut handed_out = Vec::new();
    for handle in consumes {
        let (id, value) = handle.await.unwrap();
        if let Some(value) = value {
            handed_out.push((id, value));
        }
    }

    assert_eq!(handed_out.len(), SECRETS, "each secret consumed exactly once");
    let ids: HashSet<&String> = handed_out.iter().map(|(id, _)| id).collect();
    assert_eq!(ids.len(), SECRETS, "no id handed out twice");
    for (id, value) in &handed_out {
        let expected = saved.iter().find(|(sid, _)| sid == id).map(|(_, p)| p);
        assert_eq!(Some(value), expected);
    }

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_save_consume_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    let store: Arc<dyn SecretStore> = Arc::new(FileStore::open(&path, Digest::Sha256).await.unwrap());

    let mut pairs = Vec::new();
    for i in 0..SECRETS {
        let store = store.clone();
        pairs.push(tokio::spawn(async move {
            let plain = format!("pair-{}", i);
            let id = store.save(&plain).await.unwrap();
            let first = store.consume(&id).await.unwrap();
            let second = store.consume(&id).await.unwrap();
            (plain, first, second)
        }));
    }

    let mut successes = 0;
    for handle in pairs {
        let (plain, first, second) = handle.await.unwrap();
        assert_eq!(first.as_deref(), Some(plain.as_str()));
        assert_eq!(second, None);
        successes += 1;
    }
    assert_eq!(successes, SECRETS);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_saves_yield_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        FileStore::open(dir.path().join("secrets.json"), Digest::Md5)
            .await
            .unwrap(),
    );

    let mut saves = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        saves.push(tokio::spawn(async move { store.save("same").await.unwrap() }));
    }
    let mut ids = HashSet::new();
    for handle in saves {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 1);

    let id = ids.into_iter().next().unwrap();
    assert_eq!(store.consume(&id).await.unwrap().as_deref(), Some("same"));
    assert_eq!(store.consume(&id).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_two_stores_on_one_file_exclude_each_other() {
    // Separate instances share no in-process mutex, like the server and
    // the `secret` CLI commands; only the file lock orders them.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    let stores: [Arc<dyn SecretStore>; 2] = [
        Arc::new(FileStore::open(&path, Digest::Md5).await.unwrap()),
        Arc::new(FileStore::open(&path, Digest::Md5).await.unwrap()),
    ];

    let mut saves = Vec::new();
    for i in 0..SECRETS {
        let store = stores[i % 2].clone();
        saves.push(tokio::spawn(async move {
            store.save(&format!("shared-{}", i)).await.unwrap()
        }));
    }
    let mut ids = Vec::new();
    for handle in saves {
        ids.push(handle.await.unwrap());
    }

    let on_disk: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk.len(), SECRETS, "a save was lost");

    let mut consumes = Vec::new();
    for id in &ids {
        for store in &stores {
            let store = store.clone();
            let id = id.clone();
            consumes.push(tokio::spawn(async move { store.consume(&id).await.unwrap() }));
        }
    }
    let mut handed_out = 0;
    for handle in consumes {
        if handle.await.unwrap().is_some() {
            handed_out += 1;
        }
    }

    assert_eq!(handed_out, SECRETS);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
}
