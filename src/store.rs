//! The note store: a durable `Title -> NoteRecord` mapping backed by one
//! structured file per note plus an aggregate master index.
//!
//! The master index is loaded once when the store opens and only written
//! back by [`NoteStore::merge_and_persist`]. Saving a single note touches
//! just that note's two files on disk; the aggregate catches up on the next
//! merge, which folds in every record file at least as new as the aggregate
//! itself.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::files;
use crate::record::{text_filename, timestamp_now, NoteDraft, NoteRecord};

/// Name of the aggregate master index inside a store directory.
pub const MASTER_FILENAME: &str = "notemaster.json";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The aggregate file exists but cannot be deserialized. Fatal at open
    /// time: silently resetting it would discard the whole index.
    #[error("master index {} is unreadable: {reason}", .path.display())]
    MasterCorrupt { path: PathBuf, reason: String },

    /// A note with the same derived filename already exists on disk.
    /// Not a failure: the caller decides, then retries via
    /// [`NoteStore::confirm_overwrite_and_save`].
    #[error("note file {} already exists; overwrite requires confirmation", .path.display())]
    Conflict { path: PathBuf },

    /// The title cannot produce a usable filename.
    #[error("invalid title: {reason}")]
    InvalidTitle { reason: String },

    /// A single record file could not be read or parsed outside a merge
    /// (merges skip and report instead).
    #[error("could not load record: {reason}")]
    RecordUnreadable { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What one merge pass did: titles inserted for the first time, titles
/// overwritten, and files that failed to parse and were skipped.
#[derive(Debug, Default, Clone)]
pub struct MergeReport {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

impl MergeReport {
    /// Number of records folded into the mapping.
    pub fn folded(&self) -> usize {
        self.added.len() + self.modified.len()
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// One record file the merge could not use, with the parse/read error.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}

/// An open note directory and its in-memory master mapping.
///
/// One instance owns one directory. Nothing here is shared or global, so
/// tests and embedders can hold several stores side by side.
#[derive(Debug)]
pub struct NoteStore {
    root: PathBuf,
    notes: BTreeMap<String, NoteRecord>,
}

impl NoteStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    ///
    /// A missing master index is the normal state of a fresh directory and
    /// yields an empty mapping; a corrupt one is [`StoreError::MasterCorrupt`].
    pub fn open(root: impl Into<PathBuf>) -> Result<NoteStore> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let master = root.join(MASTER_FILENAME);
        let notes = if master.exists() {
            let bytes = fs::read(&master)?;
            serde_json::from_slice(&bytes).map_err(|e| StoreError::MasterCorrupt {
                path: master.clone(),
                reason: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };
        debug!("opened store at {} with {} notes", root.display(), notes.len());
        Ok(NoteStore { root, notes })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Look up a note in the in-memory mapping by its exact title.
    pub fn get(&self, title: &str) -> Option<&NoteRecord> {
        self.notes.get(title)
    }

    /// Persist one note as its two on-disk artifacts, refusing to replace
    /// an existing note without confirmation.
    ///
    /// On success returns the record actually written, carrying the derived
    /// filename and the generated save timestamp. If the derived text file
    /// already exists this returns [`StoreError::Conflict`] and writes
    /// nothing; the caller confirms by calling
    /// [`NoteStore::confirm_overwrite_and_save`] with the same draft.
    ///
    /// The in-memory mapping is deliberately not updated here. The aggregate
    /// only learns about the note on the next [`NoteStore::merge_and_persist`].
    pub fn save_record(&self, draft: &NoteDraft) -> Result<NoteRecord> {
        validate_title(&draft.title)?;
        let text_path = self.root.join(text_filename(&draft.title));
        if text_path.exists() {
            return Err(StoreError::Conflict { path: text_path });
        }
        self.write_artifacts(draft)
    }

    /// Second half of the conflict handshake: same as [`NoteStore::save_record`]
    /// but overwrites both artifacts unconditionally.
    pub fn confirm_overwrite_and_save(&self, draft: &NoteDraft) -> Result<NoteRecord> {
        validate_title(&draft.title)?;
        self.write_artifacts(draft)
    }

    fn write_artifacts(&self, draft: &NoteDraft) -> Result<NoteRecord> {
        let record = draft.to_record(timestamp_now());
        let text_path = self.root.join(text_filename(&record.title));
        let record_path = self.root.join(&record.filename);
        let json = serde_json::to_string_pretty(&record).map_err(io::Error::other)?;
        files::write_note_files(
            &text_path,
            record.render_text().as_bytes(),
            &record_path,
            json.as_bytes(),
        )?;
        debug!("saved note '{}' as {}", record.title, record.filename);
        Ok(record)
    }

    /// Fold new and changed record files into the mapping, then write the
    /// aggregate back out.
    ///
    /// A record file qualifies when its mtime is `>=` the aggregate's
    /// pre-merge mtime; the comparison is inclusive on purpose, so a file
    /// written in the same timestamp granule as the aggregate is never
    /// missed, at the cost of occasionally re-reading an already-merged one.
    /// When the aggregate does not exist yet, every record file qualifies.
    /// Files that fail to parse are skipped and reported, never fatal.
    pub fn merge_and_persist(&mut self) -> Result<MergeReport> {
        let master_path = self.master_path();
        let master_mtime = match fs::metadata(&master_path) {
            Ok(meta) => Some(meta.modified()?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut report = MergeReport::default();
        for scanned in files::scan_records(&self.root)? {
            if let Some(threshold) = master_mtime {
                if scanned.mtime < threshold {
                    continue;
                }
            }
            match files::read_record(&scanned.path) {
                Ok(record) => {
                    if self.notes.contains_key(&record.title) {
                        report.modified.push(record.title.clone());
                    } else {
                        report.added.push(record.title.clone());
                    }
                    self.notes.insert(record.title.clone(), record);
                }
                Err(err) => {
                    warn!("skipping unreadable record {}: {:#}", scanned.filename, err);
                    report.skipped.push(SkippedFile {
                        filename: scanned.filename,
                        reason: format!("{err:#}"),
                    });
                }
            }
        }

        self.persist_master()?;
        debug!(
            "merge complete: {} added, {} modified, {} skipped",
            report.added.len(),
            report.modified.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Weak search over the mapping: the query splits on whitespace and a
    /// note matches when any query word is a case-insensitive substring of
    /// `Title + " " + Keyword`. An empty or all-whitespace query matches
    /// nothing; use [`NoteStore::list_all`] to browse everything.
    ///
    /// Results come back ascending by title. Reads memory only.
    pub fn search(&self, query: &str) -> Vec<&NoteRecord> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return Vec::new();
        }
        self.notes
            .values()
            .filter(|record| {
                let haystack = record.search_text();
                words.iter().any(|w| haystack.contains(w.as_str()))
            })
            .collect()
    }

    /// Every note in the mapping, ascending by title.
    pub fn list_all(&self) -> Vec<&NoteRecord> {
        self.notes.values().collect()
    }

    /// Read one structured record file from the store directory by its
    /// on-disk name, bypassing the mapping.
    pub fn load_single(&self, filename: &str) -> Result<NoteRecord> {
        let path = self.root.join(filename);
        files::read_record(&path).map_err(|e| StoreError::RecordUnreadable {
            path,
            reason: format!("{e:#}"),
        })
    }

    fn master_path(&self) -> PathBuf {
        self.root.join(MASTER_FILENAME)
    }

    fn persist_master(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.notes).map_err(io::Error::other)?;
        files::write_atomic(&self.master_path(), json.as_bytes())?;
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::InvalidTitle {
            reason: "title is empty".to_string(),
        });
    }
    if title.contains('/') || title.contains('\\') {
        return Err(StoreError::InvalidTitle {
            reason: "title may not contain path separators".to_string(),
        });
    }
    Ok(())
}
