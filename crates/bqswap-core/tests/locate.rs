use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bqswap_core::locate::most_recent_csv;
use tempfile::tempdir;

fn touch(dir: &Path, name: &str, age: Duration) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create fixture");
    file.set_modified(SystemTime::now() - age)
        .expect("set fixture mtime");
    path
}

#[test]
fn newest_csv_wins() {
    let dir = tempdir().expect("tempdir");
    touch(dir.path(), "a.csv", Duration::from_secs(600));
    let newest = touch(dir.path(), "b.csv", Duration::from_secs(10));
    touch(dir.path(), "c.csv", Duration::from_secs(300));

    assert_eq!(most_recent_csv(dir.path()), Some(newest));
}

#[test]
fn missing_directory_yields_none() {
    assert_eq!(
        most_recent_csv(Path::new("/definitely/not/a/real/dir")),
        None
    );
}

#[test]
fn empty_directory_yields_none() {
    let dir = tempdir().expect("tempdir");
    assert_eq!(most_recent_csv(dir.path()), None);
}

#[test]
fn non_csv_entries_are_ignored() {
    let dir = tempdir().expect("tempdir");
    touch(dir.path(), "fresh_notes.txt", Duration::from_secs(0));
    touch(dir.path(), "report.csv.bak", Duration::from_secs(0));
    let only_csv = touch(dir.path(), "old_export.csv", Duration::from_secs(3600));

    assert_eq!(most_recent_csv(dir.path()), Some(only_csv));
}
