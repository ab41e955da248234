use serde_json::json;
use survey_store::{FileStore, KeyValueStore, StoreError, UserDraftStore};

#[test]
fn drafts_survive_reopening_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("drafts.json");

    let mut drafts = UserDraftStore::new(FileStore::open(&path).expect("open"), "kunci");
    drafts
        .save("TS_001", &json!({ "answers": { "q1": "Budi" } }))
        .expect("save");
    assert!(path.exists());

    let reopened = UserDraftStore::new(FileStore::open(&path).expect("reopen"), "kunci");
    assert_eq!(
        reopened.load("TS_001").map(|value| value["answers"]["q1"].clone()),
        Some(json!("Budi"))
    );
}

#[test]
fn remove_rewrites_the_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kv.json");
    let mut store = FileStore::open(&path).expect("open");
    store.set("a", "1".into()).expect("set");
    store.set("b", "2".into()).expect("set");
    store.remove("a").expect("remove");

    let reopened = FileStore::open(&path).expect("reopen");
    assert_eq!(reopened.keys(), vec!["b".to_string()]);
    assert_eq!(reopened.path(), path.as_path());
}

#[test]
fn corrupt_document_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kv.json");
    std::fs::write(&path, "[not an object").expect("write");
    let err = FileStore::open(&path).expect_err("corrupt");
    assert!(matches!(err, StoreError::Corrupt { .. }));
}
