use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::BlockRecord;
use crate::traits::ChainStore;

/// Chain store backed by a single JSON file.
///
/// The file holds a JSON array of records indented with four spaces. Saves
/// write a temporary file in the same directory, sync it, and rename it over
/// the target, so readers only ever see a complete chain.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a chain file is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self) -> StoreResult<Vec<BlockRecord>> {
        if !self.exists() {
            debug!(path = %self.path.display(), "no chain file, starting empty");
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let records: Vec<BlockRecord> =
            serde_json::from_str(&text).map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(path = %self.path.display(), blocks = records.len(), "loaded chain file");
        Ok(records)
    }

    fn save(&self, records: &[BlockRecord]) -> StoreResult<()> {
        let dir = self.directory();
        fs::create_dir_all(dir)?;

        let mut buf = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        records
            .serialize(&mut serializer)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        buf.push(b'\n');

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&buf)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), blocks = records.len(), "saved chain file");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
