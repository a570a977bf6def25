//! File-system storage for code maps.
//!
//! Each dimension's map lives in `<base_dir>/<dimension>.csv`, a
//! comma-separated table with the header `SOURCE,COD,NAME,TARGET`.
//!
//! Files are read, modified and rewritten without locking. Runs that touch
//! the same dimension must not overlap.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codemap::{CodeMap, CodeMapEntry};
use crate::error::{MapError, Result};

#[derive(Debug, Clone)]
pub struct CodeMapRepository {
    base_dir: PathBuf,
}

impl CodeMapRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, dimension: &str) -> PathBuf {
        self.base_dir.join(format!("{dimension}.csv"))
    }

    /// Load a dimension's map. Returns `None` if no file exists.
    pub fn load(&self, dimension: &str) -> Result<Option<CodeMap>> {
        let path = self.path_for(dimension);
        if !path.is_file() {
            return Ok(None);
        }
        let read_error = |source| MapError::Read {
            path: path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .map_err(read_error)?;

        let mut entries = Vec::new();
        for row in reader.deserialize::<CodeMapEntry>() {
            entries.push(row.map_err(read_error)?);
        }
        debug!(dimension, entries = entries.len(), path = %path.display(), "Loaded code map");
        Ok(Some(CodeMap::from_entries(dimension, entries)))
    }

    /// Load a dimension's map, starting empty when no file exists.
    pub fn load_or_empty(&self, dimension: &str) -> Result<CodeMap> {
        Ok(self
            .load(dimension)?
            .unwrap_or_else(|| CodeMap::new(dimension)))
    }

    pub fn save(&self, map: &CodeMap) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).map_err(|source| MapError::CreateDir {
            path: self.base_dir.clone(),
            source,
        })?;
        let path = self.path_for(map.dimension());
        let write_error = |source| MapError::Write {
            path: path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(write_error)?;
        // Written explicitly so an empty map still carries its header.
        writer
            .write_record(["SOURCE", "COD", "NAME", "TARGET"])
            .map_err(write_error)?;
        for entry in map.entries() {
            writer.serialize(entry).map_err(write_error)?;
        }
        writer
            .flush()
            .map_err(|err| write_error(csv::Error::from(err)))?;
        debug!(dimension = map.dimension(), entries = map.len(), path = %path.display(), "Saved code map");
        Ok(path)
    }
}
