use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::glob;
use tracing::warn;

/// Find the most recently modified CSV file in `dir`.
///
/// Returns `None` when the directory does not exist or holds no `*.csv`
/// entries. Entries whose metadata cannot be read are skipped. When two
/// files share a modification time the first one in directory order wins.
pub fn most_recent_csv(dir: &Path) -> Option<PathBuf> {
    let pattern = dir.join("*.csv");
    let pattern = pattern.to_string_lossy();

    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(%pattern, %err, "invalid glob pattern for downloads directory");
            return None;
        }
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        let modified = match path.metadata().and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping entry without a modification time");
                continue;
            }
        };
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest.map(|(_, path)| path)
}
