//! Durable index storage.
//!
//! On-disk layout of an index directory:
//!
//! ```text
//! <index_path>/manifest.json   build id, model, dimensions, entry count
//! <index_path>/entries.jsonl   one IndexEntry per line, in build order
//! ```
//!
//! Writes never touch the live directory in place: the new index is staged in
//! a temporary sibling and swapped in with renames.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::retrieval::error::IndexError;
use crate::retrieval::models::IndexEntry;

pub const INDEX_FORMAT_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub build_id: Uuid,
    pub model: String,
    pub dimensions: usize,
    pub entry_count: usize,
    pub built_at: DateTime<Utc>,
    /// Dataset the index was built from, for operators.
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct StoredIndex {
    pub manifest: IndexManifest,
    pub entries: Vec<IndexEntry>,
}

/// Storage capability used by the builder and the search service.
/// A brute-force file store and a dedicated vector index are both valid backends.
pub trait IndexStore: Send + Sync {
    fn location(&self) -> &Path;
    fn exists(&self) -> bool;
    fn read_manifest(&self) -> Result<IndexManifest, IndexError>;
    fn read(&self) -> Result<StoredIndex, IndexError>;
    /// Replaces whatever index is stored with `index`.
    fn write(&self, index: &StoredIndex) -> Result<(), IndexError>;
    fn delete(&self) -> Result<(), IndexError>;
}

#[derive(Debug, Clone)]
pub struct FsIndexStore {
    root: PathBuf,
}

impl FsIndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn entries_path(&self) -> PathBuf {
        self.root.join(ENTRIES_FILE)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string())
    }

    fn stage(&self, staging: &Path, index: &StoredIndex) -> Result<(), IndexError> {
        let manifest_path = staging.join(MANIFEST_FILE);
        let manifest = serde_json::to_vec_pretty(&index.manifest)
            .map_err(|e| IndexError::corrupt(&manifest_path, e.to_string()))?;
        fs::write(&manifest_path, manifest).map_err(|e| IndexError::io(&manifest_path, e))?;

        let entries_path = staging.join(ENTRIES_FILE);
        let file = File::create(&entries_path).map_err(|e| IndexError::io(&entries_path, e))?;
        let mut writer = BufWriter::new(file);
        for entry in &index.entries {
            serde_json::to_writer(&mut writer, entry)
                .map_err(|e| IndexError::corrupt(&entries_path, e.to_string()))?;
            writer
                .write_all(b"\n")
                .map_err(|e| IndexError::io(&entries_path, e))?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| IndexError::io(&entries_path, e.into_error()))?;
        file.sync_all().map_err(|e| IndexError::io(&entries_path, e))?;
        Ok(())
    }

    /// Loads the entries file and checks it against `manifest`.
    fn read_entries(&self, manifest: &IndexManifest) -> Result<Vec<IndexEntry>, IndexError> {
        let path = self.entries_path();
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => IndexError::corrupt(&path, "entries file missing"),
            _ => IndexError::io(&path, e),
        })?;

        let mut entries = Vec::with_capacity(manifest.entry_count);
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| IndexError::io(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: IndexEntry = serde_json::from_str(&line)
                .map_err(|e| IndexError::corrupt(&path, format!("line {}: {e}", n + 1)))?;
            if entry.embedding.len() != manifest.dimensions {
                return Err(IndexError::corrupt(
                    &path,
                    format!(
                        "line {}: embedding has {} dimensions, manifest says {}",
                        n + 1,
                        entry.embedding.len(),
                        manifest.dimensions
                    ),
                ));
            }
            entries.push(entry);
        }

        if entries.len() != manifest.entry_count {
            return Err(IndexError::corrupt(
                &path,
                format!(
                    "found {} entries, manifest says {}",
                    entries.len(),
                    manifest.entry_count
                ),
            ));
        }

        Ok(entries)
    }

    /// Reads manifest and entries as one pair. A rebuild swapped in between
    /// the two opens shows up as a changed `build_id`; the read is then retried once.
    fn read_consistent<F>(&self, mut load_entries: F) -> Result<StoredIndex, IndexError>
    where
        F: FnMut(&Self, &IndexManifest) -> Result<Vec<IndexEntry>, IndexError>,
    {
        let mut retried = false;
        loop {
            let manifest = self.read_manifest()?;
            let entries = load_entries(self, &manifest);
            let unchanged = matches!(
                self.read_manifest(),
                Ok(after) if after.build_id == manifest.build_id
            );
            if unchanged {
                return entries.map(|entries| StoredIndex { manifest, entries });
            }
            if retried {
                return Err(IndexError::corrupt(
                    &self.root,
                    "index was replaced while it was being read",
                ));
            }
            debug!(
                "index {} replaced during read, reading {} again",
                manifest.build_id,
                self.root.display()
            );
            retried = true;
        }
    }
}

impl IndexStore for FsIndexStore {
    fn location(&self) -> &Path {
        &self.root
    }

    fn exists(&self) -> bool {
        self.manifest_path().is_file()
    }

    fn read_manifest(&self) -> Result<IndexManifest, IndexError> {
        let path = self.manifest_path();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(IndexError::IndexNotFound {
                    path: self.root.clone(),
                })
            }
            Err(e) => return Err(IndexError::io(&path, e)),
        };
        let manifest: IndexManifest = serde_json::from_slice(&bytes)
            .map_err(|e| IndexError::corrupt(&path, format!("unreadable manifest: {e}")))?;
        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(IndexError::corrupt(
                &path,
                format!("unsupported format version {}", manifest.format_version),
            ));
        }
        Ok(manifest)
    }

    fn read(&self) -> Result<StoredIndex, IndexError> {
        self.read_consistent(Self::read_entries)
    }

    fn write(&self, index: &StoredIndex) -> Result<(), IndexError> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| IndexError::io(&parent, e))?;

        let name = self.dir_name();
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{name}.tmp-"))
            .tempdir_in(&parent)
            .map_err(|e| IndexError::io(&parent, e))?;
        self.stage(staging.path(), index)?;

        // Nothing live has been touched up to here.
        let retired = if self.root.exists() {
            let aside = parent.join(format!(".{name}.old-{}", Uuid::new_v4()));
            fs::rename(&self.root, &aside).map_err(|e| IndexError::io(&self.root, e))?;
            Some(aside)
        } else {
            None
        };

        if let Err(e) = fs::rename(staging.path(), &self.root) {
            if let Some(aside) = &retired {
                if let Err(restore) = fs::rename(aside, &self.root) {
                    warn!(
                        "failed to restore previous index from {}: {restore}",
                        aside.display()
                    );
                }
            }
            return Err(IndexError::io(&self.root, e));
        }

        if let Some(aside) = retired {
            if let Err(e) = fs::remove_dir_all(&aside) {
                warn!("failed to remove retired index {}: {e}", aside.display());
            }
        }

        debug!(
            "index {} written to {}",
            index.manifest.build_id,
            self.root.display()
        );
        Ok(())
    }

    fn delete(&self) -> Result<(), IndexError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IndexError::io(&self.root, e)),
        }
    }
}
