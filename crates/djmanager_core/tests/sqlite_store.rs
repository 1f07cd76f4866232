mod common;

use common::{album_spec, new_song, seed_album};
use djmanager_core::db::{open_db, open_db_in_memory};
use djmanager_core::{
    AlbumRegistrar, Collection, CoreError, DeletionConflictResolver, DjSetPatch, DjSetSpec,
    ErrorKind, Outcome, RecordStore, SetMutationGuard, SongBatchWriter, SongSearch,
    SqliteRecordStore, WriteMode,
};

#[test]
fn album_lifecycle_on_sqlite_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    let album = seed_album(&store, "A", "LBL-A", &["S1", "S2"]);
    let guard = SetMutationGuard::new(&store);
    let set = guard
        .create_set(&DjSetSpec {
            title: "Z".to_string(),
            creator: "dj".to_string(),
            songs: vec![album.songs[0].id.clone()],
            ..DjSetSpec::default()
        })
        .unwrap();

    let resolver = DeletionConflictResolver::with_write_mode(&store, WriteMode::Transactional);
    let err = resolver.delete_album(&album.album.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(store.count(Collection::Songs).unwrap(), 2);

    guard.delete_set(&set.id).unwrap();
    let deletion = resolver.delete_album(&album.album.id).unwrap();
    assert_eq!(deletion.songs_deleted, 2);
    for collection in Collection::ALL {
        assert_eq!(store.count(collection).unwrap(), 0, "{collection} not empty");
    }
}

#[test]
fn transactional_create_commits_album_and_songs() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);

    let created = AlbumRegistrar::with_write_mode(&store, WriteMode::Transactional)
        .create_album_with_songs(&album_spec("T", "LBL-T"), vec![new_song("One")])
        .unwrap();

    assert!(conn.is_autocommit());
    assert_eq!(
        SongBatchWriter::new(&store)
            .get_by_album_id(&created.album.id)
            .unwrap(),
        created.songs
    );
}

#[test]
fn published_set_lock_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("djmanager.db");

    let set_id = {
        let conn = open_db(&path).unwrap();
        let store = SqliteRecordStore::new(&conn);
        let album = seed_album(&store, "A", "LBL-A", &["S1"]);
        let guard = SetMutationGuard::new(&store);
        let set = guard
            .create_set(&DjSetSpec {
                title: "Z".to_string(),
                creator: "dj".to_string(),
                songs: vec![album.songs[0].id.clone()],
                ..DjSetSpec::default()
            })
            .unwrap();
        guard.update_set(&set.id, &DjSetPatch::publish(true)).unwrap();
        set.id
    };

    let conn = open_db(&path).unwrap();
    let store = SqliteRecordStore::new(&conn);
    let err = SetMutationGuard::new(&store)
        .update_set(&set_id, &DjSetPatch::publish(false))
        .unwrap_err();
    assert!(matches!(err, CoreError::ImmutableResource { .. }));
    assert_eq!(
        SongBatchWriter::new(&store)
            .search(&SongSearch::title("s"))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn label_conflict_outcome_carries_existing_album() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    let first = seed_album(&store, "First", "LBL-1", &["One"]);

    let outcome = Outcome::from(
        AlbumRegistrar::new(&store)
            .create_album_with_songs(&album_spec("Second", "LBL-1"), vec![new_song("Two")]),
    );

    let error = outcome.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Conflict);
    let data = outcome.data.unwrap();
    assert_eq!(data["_id"], first.album.id.as_str());
    assert_eq!(data["label_number"], "LBL-1");
}
