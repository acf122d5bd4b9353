//! Contract tests for DiagnosisStore. Both backends must pass the same checks.

use beltsaver_core::{
    resolve, DiagnosisId, DiagnosisStore, DiagnosticInput, Direction, FileDiagnosisStore,
    Location, MemoryDiagnosisStore, OwnerId, SeverityReport, StoreError, Symptom,
};

fn sample(location: Location) -> DiagnosticInput {
    DiagnosticInput {
        location,
        direction: Direction::Loaded,
        severity_report: SeverityReport::Moderate,
        symptom: Symptom::Noise,
    }
}

async fn insert_assigns_identity(store: &dyn DiagnosisStore) {
    let owner = OwnerId("alice".into());
    let input = sample(Location::Tail);
    let a = store.insert(&owner, input, resolve(&input)).await.unwrap();
    let b = store.insert(&owner, input, resolve(&input)).await.unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.owner, owner);
    assert_eq!(a.result, resolve(&input));
    assert!(b.created_at >= a.created_at);
}

async fn list_is_owner_scoped_and_newest_first(store: &dyn DiagnosisStore) {
    let alice = OwnerId("alice".into());
    let bob = OwnerId("bob".into());
    for l in [Location::Head, Location::Tail, Location::Midspan] {
        let input = sample(l);
        store.insert(&alice, input, resolve(&input)).await.unwrap();
    }
    let input = sample(Location::Multiple);
    store.insert(&bob, input, resolve(&input)).await.unwrap();

    let mine = store.list_recent(&alice, 10).await.unwrap();
    assert_eq!(mine.len(), 3);
    assert!(mine.iter().all(|r| r.owner == alice));
    assert_eq!(mine[0].input.location, Location::Midspan);
    assert_eq!(mine[2].input.location, Location::Head);

    let limited = store.list_recent(&alice, 2).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].input.location, Location::Midspan);

    assert!(store.list_recent(&OwnerId("carol".into()), 10).await.unwrap().is_empty());
}

async fn delete_is_owner_restricted(store: &dyn DiagnosisStore) {
    let alice = OwnerId("alice".into());
    let bob = OwnerId("bob".into());
    let input = sample(Location::Head);
    let rec = store.insert(&alice, input, resolve(&input)).await.unwrap();

    let err = store.delete(&bob, &rec.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwner { .. }));
    assert_eq!(store.list_recent(&alice, 10).await.unwrap().len(), 1);

    store.delete(&alice, &rec.id).await.unwrap();
    assert!(store.list_recent(&alice, 10).await.unwrap().is_empty());

    let err = store.delete(&alice, &rec.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    let err = store.delete(&alice, &DiagnosisId::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn memory_insert_assigns_identity() {
    insert_assigns_identity(&MemoryDiagnosisStore::new()).await;
}

#[tokio::test]
async fn memory_list_is_owner_scoped_and_newest_first() {
    list_is_owner_scoped_and_newest_first(&MemoryDiagnosisStore::new()).await;
}

#[tokio::test]
async fn memory_delete_is_owner_restricted() {
    delete_is_owner_restricted(&MemoryDiagnosisStore::new()).await;
}

#[tokio::test]
async fn file_insert_assigns_identity() {
    let dir = tempfile::tempdir().unwrap();
    insert_assigns_identity(&FileDiagnosisStore::new(dir.path())).await;
}

#[tokio::test]
async fn file_list_is_owner_scoped_and_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    list_is_owner_scoped_and_newest_first(&FileDiagnosisStore::new(dir.path())).await;
}

#[tokio::test]
async fn file_delete_is_owner_restricted() {
    let dir = tempfile::tempdir().unwrap();
    delete_is_owner_restricted(&FileDiagnosisStore::new(dir.path())).await;
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let owner = OwnerId("user@example.com".into());
    let input = sample(Location::Tail);
    let saved = {
        let store = FileDiagnosisStore::new(dir.path());
        store.insert(&owner, input, resolve(&input)).await.unwrap()
    };

    let reopened = FileDiagnosisStore::new(dir.path());
    let listed = reopened.list_recent(&owner, 5).await.unwrap();
    assert_eq!(listed, vec![saved]);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn file_store_keeps_colliding_owners_apart() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileDiagnosisStore::new(dir.path());
    let dotted = OwnerId("a.b".into());
    let underscored = OwnerId("a_b".into());

    let input = sample(Location::Head);
    let dotted_rec = store.insert(&dotted, input, resolve(&input)).await.unwrap();
    let input = sample(Location::Tail);
    let underscored_rec = store.insert(&underscored, input, resolve(&input)).await.unwrap();

    // Both owners sanitise to the same stem.
    assert!(dir.path().join("a_b.json").exists());

    let listed = store.list_recent(&dotted, 10).await.unwrap();
    assert_eq!(listed, vec![dotted_rec.clone()]);
    let listed = store.list_recent(&underscored, 10).await.unwrap();
    assert_eq!(listed, vec![underscored_rec]);

    let err = store.delete(&underscored, &dotted_rec.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwner { .. }));
    assert_eq!(store.list_recent(&dotted, 10).await.unwrap(), vec![dotted_rec]);
}

#[tokio::test]
async fn file_store_ignores_stale_temp_from_another_writer() {
    let dir = tempfile::tempdir().unwrap();
    // A temp path left behind under the old fixed name, held as a directory so
    // writing through it would fail.
    let stale = dir.path().join(".alice.json.tmp");
    std::fs::create_dir_all(&stale).unwrap();

    let store = FileDiagnosisStore::new(dir.path());
    let owner = OwnerId("alice".into());
    for l in [Location::Head, Location::Midspan] {
        let input = sample(l);
        store.insert(&owner, input, resolve(&input)).await.unwrap();
    }
    assert_eq!(store.list_recent(&owner, 10).await.unwrap().len(), 2);

    let temps: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert_eq!(temps, vec![".alice.json.tmp".to_string()]);
}
