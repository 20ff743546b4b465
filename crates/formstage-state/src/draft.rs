//! # Draft Persistence
//!
//! A draft is the JSON snapshot of in-progress form state, written after
//! every accepted mutation and read back when a session opens. Storage is
//! a key/value collaborator behind [`DraftStore`]; the session treats its
//! failures as non-fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use formstage_core::Schema;
use thiserror::Error;

/// Prefix of every draft key.
pub const DRAFT_KEY_PREFIX: &str = "formDraft";

/// The storage key for a schema's draft: `formDraft:<id>` with the id
/// trimmed, or `formDraft` when the schema has no id or a blank one.
pub fn draft_key(schema: &Schema) -> String {
    match schema.id().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("{DRAFT_KEY_PREFIX}:{id}"),
        None => DRAFT_KEY_PREFIX.to_string(),
    }
}

/// Draft storage failure.
#[derive(Error, Debug)]
pub enum DraftError {
    /// The backing store could not be read or written.
    #[error("draft storage error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Key/value storage for draft snapshots.
pub trait DraftStore {
    /// The stored snapshot, or `None` when no draft exists.
    fn load(&self, key: &str) -> Result<Option<String>, DraftError>;

    /// Replace the stored snapshot.
    fn save(&mut self, key: &str, snapshot: &str) -> Result<(), DraftError>;

    /// Remove the snapshot. Removing a missing draft is not an error.
    fn clear(&mut self, key: &str) -> Result<(), DraftError>;
}

/// In-process draft storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    drafts: HashMap<String, String>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a snapshot, as if a previous session had saved it.
    pub fn with_draft(mut self, key: impl Into<String>, snapshot: impl Into<String>) -> Self {
        self.drafts.insert(key.into(), snapshot.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.drafts.get(key).map(String::as_str)
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &str) -> Result<Option<String>, DraftError> {
        Ok(self.drafts.get(key).cloned())
    }

    fn save(&mut self, key: &str, snapshot: &str) -> Result<(), DraftError> {
        self.drafts.insert(key.to_string(), snapshot.to_string());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), DraftError> {
        self.drafts.remove(key);
        Ok(())
    }
}

/// One JSON file per draft under a directory.
///
/// Keys are mapped to file names byte by byte: `[A-Za-z0-9.-]` is kept and
/// every other byte becomes `_` followed by two lowercase hex digits, so
/// `formDraft:survey` is stored in `formDraft_3asurvey.json`. The mapping
/// is injective; distinct keys never share a file.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a key is stored in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len() + 5);
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
                file.push(char::from(byte));
            } else {
                file.push('_');
                file.push_str(&hex::encode([byte]));
            }
        }
        file.push_str(".json");
        self.dir.join(file)
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, key: &str) -> Result<Option<String>, DraftError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DraftError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, snapshot: &str) -> Result<(), DraftError> {
        let io = |source| DraftError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        std::fs::write(self.path_for(key), snapshot).map_err(io)
    }

    fn clear(&mut self, key: &str) -> Result<(), DraftError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DraftError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
