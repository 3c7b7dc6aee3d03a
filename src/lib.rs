//! # ZhuNote
//!
//! A file-backed personal note store with incremental merge and keyword
//! search.
//!
//! Every note is persisted as two sibling files in one flat directory: a
//! structured `.note` record and a human-readable `.txt` rendering, both
//! named after the note's title. A separate aggregate file, the master
//! index, holds the full `Title -> Record` mapping and is brought up to
//! date by an incremental merge that folds in every record file at least
//! as new as the index itself.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  save    ┌────────────────┐  merge   ┌──────────────────┐
//! │  caller  │─────────▶│   NoteStore    │─────────▶│ notemaster.json  │
//! │ (zn, UI) │◀─────────│ Title → Record │◀─────────│ + *.note, *.txt  │
//! └──────────┘  search  └────────────────┘  scan    └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! zn save --title "My First Note" --keyword "rust, journal" --body "hello"
//! zn merge                      # fold note files into the master index
//! zn search rust                # weak match on title + keywords
//! zn list                       # every note, sorted by title
//! zn show My_First_Note.note    # print one record file
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`record`] | The note record and its derived filenames |
//! | [`store`] | The master mapping: load, save, merge, search |
//! | [`files`] | Directory scanning and atomic file writes |

pub mod config;
pub mod files;
pub mod record;
pub mod store;
