use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use progression_core::{
    GameProgress, LevelId, LevelStats, PersistedProgress, ProgressStore, StoreError,
};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{decode, encode};

/// Store persisting progress to a JSON file on disk.
///
/// Writes go to a temporary file in the target directory which is synced
/// and then renamed over the target, so a crash never leaves a torn file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store reading from and writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the persisted document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, contents: &str) -> io::Result<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(directory)?;

        let mut staged = NamedTempFile::new_in(directory)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        let _ = staged.persist(&self.path).map_err(|error| error.error)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&mut self) -> PersistedProgress {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                debug!(path = %self.path.display(), "reading persisted progress");
                decode(&raw)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no progress file yet");
                PersistedProgress::default()
            }
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    %error,
                    "progress file unreadable, starting fresh"
                );
                PersistedProgress::default()
            }
        }
    }

    fn save(
        &mut self,
        progress: &GameProgress,
        stats: &BTreeMap<LevelId, LevelStats>,
    ) -> Result<(), StoreError> {
        let contents = encode(progress, stats)?;
        self.write_atomically(&contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
