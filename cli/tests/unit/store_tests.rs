//! Workspace store tests against real temp directories.

#![allow(clippy::expect_used)]

use hivemind_cli::store::WorkspaceStore;
use hivemind_common::StoreError;
use tempfile::TempDir;

fn store(root: &TempDir) -> WorkspaceStore {
    WorkspaceStore::new(root.path().to_path_buf())
}

#[test]
fn write_places_artifacts_in_owner_tree() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    let (spec, stanza) = store
        .write(Some("alice"), "bot1", "{}", "[program:x]")
        .expect("write succeeds");

    assert_eq!(
        spec,
        root.path().join("alice").join("agents").join("bot1_agent.json")
    );
    assert_eq!(
        stanza,
        root.path().join("alice").join("supervisor").join("bot1.conf")
    );
    assert_eq!(
        std::fs::read_to_string(&spec).expect("spec readable"),
        "{}"
    );
}

#[test]
fn write_refuses_to_overwrite() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    store
        .write(None, "bot1", "first", "[program:x]")
        .expect("first write succeeds");
    let err = store
        .write(None, "bot1", "second", "[program:x]")
        .expect_err("second write fails");
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
    assert_eq!(
        std::fs::read_to_string(store.spec_path(None, "bot1")).expect("spec readable"),
        "first"
    );
}

#[test]
fn failed_stanza_write_rolls_back_the_spec_file() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    // A directory squatting on the stanza path makes its write fail.
    std::fs::create_dir_all(store.stanza_path(None, "bot1")).expect("squatting dir");

    let err = store
        .write(None, "bot1", "{}", "[program:x]")
        .expect_err("write fails");
    assert!(matches!(err, StoreError::Io { .. }));
    assert!(
        !store.exists(None, "bot1"),
        "a failed create must not leave a spec file behind"
    );

    // With the obstruction gone the same key is creatable again.
    std::fs::remove_dir(store.stanza_path(None, "bot1")).expect("cleanup");
    store
        .write(None, "bot1", "{}", "[program:x]")
        .expect("write succeeds after cleanup");
}

#[test]
fn remove_is_idempotent() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    store
        .write(None, "bot1", "{}", "[program:x]")
        .expect("write succeeds");
    store.remove(None, "bot1").expect("first remove");
    store.remove(None, "bot1").expect("second remove is a no-op");
    assert!(!store.exists(None, "bot1"));
}

#[test]
fn remove_survives_a_missing_stanza() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    store
        .write(None, "bot1", "{}", "[program:x]")
        .expect("write succeeds");
    std::fs::remove_file(store.stanza_path(None, "bot1")).expect("stanza removed by hand");
    store.remove(None, "bot1").expect("remove still succeeds");
}

#[test]
fn list_names_is_sorted_and_tolerates_missing_dir() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    assert!(store.list_names(None).expect("empty listing").is_empty());

    store
        .write(None, "zeta", "{}", "[program:x]")
        .expect("write zeta");
    store
        .write(None, "alpha", "{}", "[program:x]")
        .expect("write alpha");

    assert_eq!(store.list_names(None).expect("listing"), vec!["alpha", "zeta"]);
}

#[test]
fn list_names_ignores_foreign_files() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    store
        .write(None, "bot1", "{}", "[program:x]")
        .expect("write succeeds");
    // Log files and strays share the agents dir but are not specs.
    store.ensure_log_file(None, "bot1").expect("log file");
    std::fs::write(store.agents_dir(None).join("notes.txt"), "x").expect("stray file");

    assert_eq!(store.list_names(None).expect("listing"), vec!["bot1"]);
}

#[test]
fn list_owners_finds_only_owner_trees() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    store
        .write(Some("alice"), "bot1", "{}", "[program:x]")
        .expect("alice write");
    store
        .write(None, "bot2", "{}", "[program:x]")
        .expect("unowned write");

    assert_eq!(store.list_owners().expect("owners"), vec!["alice"]);
}

#[test]
fn ensure_log_file_creates_and_preserves() {
    let root = TempDir::new().expect("tempdir");
    let store = store(&root);

    let path = store.ensure_log_file(None, "bot1").expect("created");
    assert!(path.is_file());
    std::fs::write(&path, "existing logs").expect("write logs");
    store.ensure_log_file(None, "bot1").expect("second call");
    assert_eq!(
        std::fs::read_to_string(&path).expect("logs readable"),
        "existing logs"
    );
}
