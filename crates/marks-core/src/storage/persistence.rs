//! Dataset persistence
//!
//! The whole dataset lives in one pretty-printed JSON file. Loads read the
//! entire file; saves replace it using atomic writes (write to temp file,
//! then rename) so readers never see a partially-written snapshot.
//!
//! Storage location: `~/.local/share/marks/data.json` (configurable via `Config`)

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::Dataset;

/// Persistence layer for the dataset file
pub struct JsonPersistence {
    path: PathBuf,
}

impl JsonPersistence {
    /// Create a persistence handler for the configured data file
    pub fn new(config: &Config) -> Self {
        Self::at(config.data_path())
    }

    /// Create a persistence handler for an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the dataset
    ///
    /// A missing file is a first run and yields an empty dataset.
    /// A file that exists but can't be read or parsed is an error.
    pub fn load(&self) -> Result<Dataset> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no data file, starting empty");
                return Ok(Dataset::new());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read data file");
                return Err(Error::StorageCorruption {
                    path: self.path.clone(),
                    details: e.to_string(),
                });
            }
        };

        let dataset: Dataset = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to parse data file");
            Error::StorageCorruption {
                path: self.path.clone(),
                details: e.to_string(),
            }
        })?;

        debug!(
            path = %self.path.display(),
            bookmarks = dataset.bookmarks.len(),
            categories = dataset.categories.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Replace the stored dataset with `dataset`
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(dataset).map_err(|e| Error::StorageWrite {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        atomic_write(&self.path, &bytes).map_err(|(path, source)| {
            warn!(path = %path.display(), error = %source, "failed to save dataset");
            Error::StorageWrite { path, source }
        })?;

        debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            "saved dataset"
        );
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// On failure returns the path that could not be written alongside the error.
fn atomic_write(path: &Path, data: &[u8]) -> std::result::Result<(), (PathBuf, io::Error)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| (parent.to_path_buf(), e))?;
    }

    // Same directory so the rename stays atomic
    let temp_path = path.with_extension("json.tmp");

    let write = || -> io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&temp_path);
        return Err((temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        (path.to_path_buf(), e)
    })
}
