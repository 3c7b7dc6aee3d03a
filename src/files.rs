//! Filesystem plumbing for the store: scanning the root for record files,
//! reading them back, and writing artifacts atomically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::record::{NoteRecord, RECORD_EXT};

/// One record file found by [`scan_records`], with the modification time
/// the merge fold orders by.
#[derive(Debug, Clone)]
pub struct ScannedRecord {
    pub path: PathBuf,
    pub filename: String,
    pub mtime: SystemTime,
}

/// List every structured record file directly under `root`.
///
/// The scan is flat (no subdirectories) and matches on the `.note`
/// extension alone, so the aggregate file and any `*.tmp` leftovers from an
/// interrupted write are never picked up. Dot-named files get no special
/// treatment; a title like `.bashrc notes` produces a record the merge must
/// still fold. Results are sorted by `(mtime, filename)` ascending so a
/// fold over them is deterministic and the newest file wins when two share
/// a title.
pub fn scan_records(root: &Path) -> io::Result<Vec<ScannedRecord>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.path().extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
            continue;
        }
        let mtime = entry.metadata().map_err(io::Error::other)?.modified()?;
        found.push(ScannedRecord {
            path: entry.path().to_path_buf(),
            filename: name,
            mtime,
        });
    }
    found.sort_by(|a, b| (a.mtime, &a.filename).cmp(&(b.mtime, &b.filename)));
    Ok(found)
}

/// Read and parse one structured record file.
pub fn read_record(path: &Path) -> Result<NoteRecord> {
    let bytes =
        fs::read(path).with_context(|| format!("reading record {}", path.display()))?;
    let record = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing record {}", path.display()))?;
    Ok(record)
}

/// Write `contents` to `path` via a temporary sibling and an atomic rename,
/// so readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write a note's two artifacts together: stage both temp files first, then
/// rename both into place. A failure before the first rename leaves the
/// note untouched on disk; the remaining window is the gap between the two
/// renames.
pub fn write_note_files(
    text_path: &Path,
    text: &[u8],
    record_path: &Path,
    record: &[u8],
) -> io::Result<()> {
    let text_tmp = tmp_path(text_path);
    let record_tmp = tmp_path(record_path);
    fs::write(&text_tmp, text)?;
    if let Err(e) = fs::write(&record_tmp, record) {
        let _ = fs::remove_file(&text_tmp);
        return Err(e);
    }
    fs::rename(&text_tmp, text_path)?;
    fs::rename(&record_tmp, record_path)?;
    Ok(())
}

/// Temporary sibling name for `path`: the original extension with `.tmp`
/// appended, e.g. `A.note` -> `A.note.tmp`. Keeping the original extension
/// in the name makes leftovers easy to attribute after a crash.
fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}
