mod common;

use std::path::Path;

use common::entry;
use tempfile::tempdir;

#[test]
fn create_rejects_a_file_over_the_size_limit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("huge.cdb");
    {
        // A sparse file: logical size exceeds u32::MAX without allocating
        // that much disk.
        let f = std::fs::File::create(&path).unwrap();
        f.set_len(u32::MAX as u64 + 1).unwrap();
    }
    let err = mcdb::Db::create(None, &path).unwrap_err();
    assert!(matches!(err, mcdb::Error::MapError { .. }));
}

#[test]
fn create_on_missing_file_is_an_open_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does-not-exist.cdb");
    let err = mcdb::Db::create(None, &path).unwrap_err();
    assert!(matches!(err, mcdb::Error::OpenError { .. }));
}

#[test]
fn create_with_missing_directory_is_an_open_error() {
    let dir = tempdir().unwrap();
    let missing_dir = dir.path().join("nope");
    let err = mcdb::Db::create(Some(&missing_dir), Path::new("db.cdb")).unwrap_err();
    assert!(matches!(err, mcdb::Error::OpenError { .. }));
}

#[test]
fn dirname_relative_open_finds_the_file() {
    let dir = tempdir().unwrap();
    common::write_db(&dir.path().join("db.cdb"), &[entry(0, b"k", b"v")]);

    let db = mcdb::Db::create(Some(dir.path()), Path::new("db.cdb")).unwrap();
    let mut h = db.handle();
    assert_eq!(h.get(b"k", 0), Some(b"v".to_vec()));
}

#[test]
fn read_value_rejects_out_of_range_position_or_length() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.cdb");
    common::write_db(&path, &[entry(0, b"k", b"v")]);

    let db = mcdb::Db::create(None, &path).unwrap();
    let h = db.handle();

    assert_eq!(h.read_value(u32::MAX - 1, 10), None);
    assert_eq!(h.read_value(0, u32::MAX), None);
}

#[test]
fn find_next_without_find_start_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.cdb");
    common::write_db(&path, &[entry(0, b"k", b"v")]);

    let db = mcdb::Db::create(None, &path).unwrap();
    let mut h = db.handle();
    assert_eq!(h.find_next(b"k", 0), None);
}

#[test]
fn find_next_after_exhausted_probe_stays_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.cdb");
    common::write_db(&path, &[entry(0, b"k", b"v")]);

    let db = mcdb::Db::create(None, &path).unwrap();
    let mut h = db.handle();
    assert!(h.find_start(b"missing", 0) || !h.find_start(b"missing", 0));
    assert_eq!(h.find_next(b"missing", 0), None);
    assert_eq!(h.find_next(b"missing", 0), None);
}

#[test]
fn empty_key_and_empty_value_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.cdb");
    common::write_db(&path, &[entry(0, b"", b""), entry(0, b"k", b"")]);

    let db = mcdb::Db::create(None, &path).unwrap();
    let mut h = db.handle();
    assert_eq!(h.get(b"", 0), Some(Vec::new()));
    assert_eq!(h.get(b"k", 0), Some(Vec::new()));
}
