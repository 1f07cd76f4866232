mod common;

use common::{seed_album, FlakyStore};
use djmanager_core::{
    Collection, Conflict, CoreConfig, CoreError, DeletionConflictResolver, DjSetSpec, Filter,
    FindOptions, MemoryRecordStore, PartialWrite, RecordId, RecordStore, SetMutationGuard,
    SongBatchWriter, SongSpec, WriteMode,
};
use std::time::{Duration, Instant};

fn draft_set(title: &str, songs: Vec<RecordId>) -> DjSetSpec {
    DjSetSpec {
        title: title.to_string(),
        creator: "dj".to_string(),
        songs,
        ..DjSetSpec::default()
    }
}

#[test]
fn album_with_song_in_set_is_not_deleted() {
    let store = MemoryRecordStore::new();
    let a = seed_album(&store, "A", "LBL-A", &["S1", "S2"]);
    let s1 = a.songs[0].clone();
    let z = SetMutationGuard::new(&store)
        .create_set(&draft_set("Z", vec![s1.id.clone()]))
        .unwrap();

    let err = DeletionConflictResolver::new(&store)
        .delete_album(&a.album.id)
        .unwrap_err();

    match err {
        CoreError::Conflict(Conflict::AlbumInUse {
            album_id,
            conflicts,
        }) => {
            assert_eq!(album_id, a.album.id);
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].song_id, s1.id);
            assert_eq!(conflicts[0].song_title, "S1");
            assert_eq!(conflicts[0].set_id, z.id);
            assert_eq!(conflicts[0].set_title, "Z");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count(Collection::Albums).unwrap(), 1);
    assert_eq!(store.count(Collection::Songs).unwrap(), 2);
    assert_eq!(store.count(Collection::Sets).unwrap(), 1);
}

#[test]
fn conflicts_are_reported_across_every_set() {
    let store = MemoryRecordStore::new();
    let a = seed_album(&store, "A", "LBL-A", &["S1", "S2"]);
    let guard = SetMutationGuard::new(&store);
    guard
        .create_set(&draft_set("Y", vec![a.songs[1].id.clone(), a.songs[0].id.clone()]))
        .unwrap();
    guard
        .create_set(&draft_set("Z", vec![a.songs[0].id.clone()]))
        .unwrap();

    let err = DeletionConflictResolver::new(&store)
        .delete_album(&a.album.id)
        .unwrap_err();

    let conflicts = match err {
        CoreError::Conflict(Conflict::AlbumInUse { conflicts, .. }) => conflicts,
        other => panic!("unexpected error: {other}"),
    };
    let pairs: Vec<_> = conflicts
        .iter()
        .map(|c| (c.song_title.as_str(), c.set_title.as_str()))
        .collect();
    assert_eq!(pairs, vec![("S2", "Y"), ("S1", "Y"), ("S1", "Z")]);
}

#[test]
fn unreferenced_album_is_deleted_with_its_songs() {
    let store = MemoryRecordStore::new();
    let b = seed_album(&store, "B", "LBL-B", &["S3", "S4"]);
    let other = seed_album(&store, "Other", "LBL-O", &["S5"]);

    let deletion = DeletionConflictResolver::new(&store)
        .delete_album(&b.album.id)
        .unwrap();

    assert_eq!(deletion.deleted_count, 1);
    assert_eq!(deletion.songs_deleted, 2);
    assert_eq!(store.count(Collection::Albums).unwrap(), 1);
    assert_eq!(store.count(Collection::Songs).unwrap(), 1);
    assert!(store
        .find_one(
            Collection::Songs,
            &Filter::id(&other.songs[0].id),
            &FindOptions::default()
        )
        .unwrap()
        .is_some());
}

#[test]
fn repeated_delete_reports_not_found() {
    let store = MemoryRecordStore::new();
    let b = seed_album(&store, "B", "LBL-B", &["S3"]);
    let resolver = DeletionConflictResolver::new(&store);

    resolver.delete_album(&b.album.id).unwrap();
    for _ in 0..2 {
        let err = resolver.delete_album(&b.album.id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound {
                collection: Collection::Albums,
                ..
            }
        ));
    }
}

#[test]
fn hyphenated_and_uppercase_ids_resolve_to_the_same_album() {
    let store = MemoryRecordStore::new();
    let b = seed_album(&store, "B", "LBL-B", &["S3", "S4"]);
    let raw = b.album.id.as_str();
    let hyphenated = format!(
        "{}-{}-{}-{}-{}",
        &raw[0..8],
        &raw[8..12],
        &raw[12..16],
        &raw[16..20],
        &raw[20..]
    )
    .to_uppercase();

    let deletion = DeletionConflictResolver::new(&store)
        .delete_album(&RecordId::new(hyphenated))
        .unwrap();

    assert_eq!(deletion.deleted_count, 1);
    assert_eq!(deletion.songs_deleted, 2);
    assert_eq!(store.count(Collection::Songs).unwrap(), 0);
}

#[test]
fn stray_songs_of_a_missing_album_are_cleaned_up() {
    let store = MemoryRecordStore::new();
    let b = seed_album(&store, "B", "LBL-B", &["S3"]);
    store
        .delete_one(Collection::Albums, &Filter::id(&b.album.id))
        .unwrap();

    let err = DeletionConflictResolver::new(&store)
        .delete_album(&b.album.id)
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(store.count(Collection::Songs).unwrap(), 0);
}

#[test]
fn cascade_failure_reports_orphaned_songs_in_best_effort_mode() {
    let store = FlakyStore::failing_song_delete();
    let b = seed_album(&store, "B", "LBL-B", &["S3"]);

    let err = DeletionConflictResolver::new(&store)
        .delete_album(&b.album.id)
        .unwrap_err();

    assert_eq!(
        err.partial_write(),
        Some(&PartialWrite::AlbumDeleted {
            album_id: b.album.id.clone()
        })
    );
    assert_eq!(store.count(Collection::Albums).unwrap(), 0);
    assert_eq!(store.count(Collection::Songs).unwrap(), 1);
}

#[test]
fn cascade_failure_restores_album_in_transactional_mode() {
    let store = FlakyStore::failing_song_delete();
    let b = seed_album(&store, "B", "LBL-B", &["S3"]);

    let err = DeletionConflictResolver::with_write_mode(&store, WriteMode::Transactional)
        .delete_album(&b.album.id)
        .unwrap_err();

    assert_eq!(err.partial_write(), Some(&PartialWrite::None));
    assert_eq!(store.count(Collection::Albums).unwrap(), 1);
    assert_eq!(store.count(Collection::Songs).unwrap(), 1);
}

#[test]
fn large_set_is_resolved_in_order_and_deletion_stays_fast() {
    const SET_SIZE: usize = 5_000;
    let store = MemoryRecordStore::new();
    let target = seed_album(&store, "B", "LBL-B", &["S3"]);
    let catalog = seed_album(&store, "Catalog", "LBL-C", &["C0"]).album;
    let batch: Vec<SongSpec> = (1..SET_SIZE)
        .map(|n| SongSpec {
            title: format!("C{n}"),
            artists: vec!["Various".to_string()],
            album_id: catalog.id.clone(),
        })
        .collect();
    SongBatchWriter::new(&store).insert_batch(&batch).unwrap();

    let mut song_ids: Vec<RecordId> = SongBatchWriter::new(&store)
        .get_by_album_id(&catalog.id)
        .unwrap()
        .into_iter()
        .map(|song| song.id)
        .collect();
    song_ids.reverse();
    let set = SetMutationGuard::new(&store)
        .create_set(&draft_set("Marathon", song_ids.clone()))
        .unwrap();
    let resolved: Vec<RecordId> = set.songs.into_iter().map(|song| song.id).collect();
    assert_eq!(resolved, song_ids);

    let started_at = Instant::now();
    let deletion = DeletionConflictResolver::new(&store)
        .delete_album(&target.album.id)
        .unwrap();
    let elapsed = started_at.elapsed();

    assert_eq!(deletion.songs_deleted, 1);
    assert!(
        elapsed < Duration::from_secs(5),
        "deleting next to a {SET_SIZE}-song set took {elapsed:?}"
    );
}

#[test]
fn configured_transactional_mode_restores_album_after_cascade_failure() {
    let config = CoreConfig::from_toml_str("write_mode = \"transactional\"").unwrap();
    let store = FlakyStore::failing_song_delete();
    let b = seed_album(&store, "B", "LBL-B", &["S3"]);
    let resolver = DeletionConflictResolver::from_config(&store, &config);
    assert_eq!(resolver.write_mode(), WriteMode::Transactional);

    resolver.delete_album(&b.album.id).unwrap_err();

    assert_eq!(store.count(Collection::Albums).unwrap(), 1);
}
