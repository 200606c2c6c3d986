use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::app::Result;
use crate::domain::FeedSnapshot;
use crate::store::SnapshotStore;

const SNAPSHOT_FILE: &str = "snapshot.json";

/// Keeps one JSON snapshot per source under `<data_dir>/rss/<source_id>/`.
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            root: data_dir.as_ref().join("rss"),
        }
    }

    pub fn source_dir(&self, source_id: &str) -> PathBuf {
        self.root.join(source_id)
    }

    pub fn snapshot_path(&self, source_id: &str) -> PathBuf {
        self.source_dir(source_id).join(SNAPSHOT_FILE)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, source_id: &str) -> Result<Option<FeedSnapshot>> {
        let path = self.snapshot_path(source_id);
        tracing::debug!(path = %path.display(), "Reading old snapshot");

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot = serde_json::from_slice(&content)?;
        Ok(Some(snapshot))
    }

    fn save(&self, source_id: &str, snapshot: &FeedSnapshot) -> Result<()> {
        let dir = self.source_dir(source_id);
        fs::create_dir_all(&dir)?;

        let path = dir.join(SNAPSHOT_FILE);
        tracing::info!(path = %path.display(), entries = snapshot.len(), "Saving new snapshot");

        // Same directory keeps the final rename on one filesystem.
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(())
    }
}
