//! The note record: the atomic unit of persisted data.
//!
//! A record is keyed by its title. The on-disk names of both artifacts (the
//! structured `.note` file and the human-readable `.txt` rendering) derive
//! from the title, so re-saving under the same title overwrites in place.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Extension of the structured (JSON) record file.
pub const RECORD_EXT: &str = "note";

/// Extension of the plain-text rendering.
pub const TEXT_EXT: &str = "txt";

/// Timestamp layout used in the `Time` field, e.g. `2026-08-25-14-32-07`.
pub const TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// A fully populated, persisted note.
///
/// Serialized field names match the original on-disk key set
/// (`Filename`, `Time`, `Title`, `Keyword`, `Figure`, `HTML`, `Body`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NoteRecord {
    /// Name of this record's structured file, derived from the title.
    pub filename: String,
    /// Save timestamp, local time, formatted per [`TIME_FORMAT`].
    pub time: String,
    /// Primary key within a store.
    pub title: String,
    /// Comma-delimited tag list, searched together with the title.
    pub keyword: String,
    /// Comma-delimited figure filenames (references only, never validated).
    pub figure: String,
    /// Filename of an associated rendered-HTML document (reference only).
    #[serde(rename = "HTML")]
    pub html: String,
    /// Free-form note text.
    pub body: String,
}

/// Caller-supplied fields of a note about to be saved.
///
/// `Filename` and `Time` are generated by the store at save time, so they
/// have no place here.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub keyword: String,
    pub figure: String,
    pub html: String,
    pub body: String,
}

impl NoteDraft {
    /// Build the full record that `save` will write, stamping it with `time`.
    pub fn to_record(&self, time: String) -> NoteRecord {
        NoteRecord {
            filename: record_filename(&self.title),
            time,
            title: self.title.clone(),
            keyword: self.keyword.clone(),
            figure: self.figure.clone(),
            html: self.html.clone(),
            body: self.body.clone(),
        }
    }
}

impl NoteRecord {
    /// The plain-text rendering written next to the structured file:
    /// one `Field: value` line per field, fixed order. The `Filename` line
    /// shows the `.txt` name, not the structured file's.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Filename: {}\n", text_filename(&self.title)));
        out.push_str(&format!("Time: {}\n", self.time));
        out.push_str(&format!("Title: {}\n", self.title));
        out.push_str(&format!("Keyword: {}\n", self.keyword));
        out.push_str(&format!("Figure: {}\n", self.figure));
        out.push_str(&format!("HTML: {}\n", self.html));
        out.push_str(&format!("Body: {}\n", self.body));
        out
    }

    /// Lowercased `Title + " " + Keyword`, the haystack the weak search
    /// scans for query words.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.keyword).to_lowercase()
    }
}

/// Derive the base filename from a title: spaces become underscores.
/// Nothing else is normalized; the mapping must stay 1:1 with the title.
pub fn derive_basename(title: &str) -> String {
    title.replace(' ', "_")
}

/// Name of the structured record file for a title, `<base>.note`.
pub fn record_filename(title: &str) -> String {
    format!("{}.{}", derive_basename(title), RECORD_EXT)
}

/// Name of the text rendering for a title, `<base>.txt`.
pub fn text_filename(title: &str) -> String {
    format!("{}.{}", derive_basename(title), TEXT_EXT)
}

/// Current local time in the fixed note timestamp layout.
pub fn timestamp_now() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NoteRecord {
        NoteDraft {
            title: "My First Note".to_string(),
            keyword: "rust, journal".to_string(),
            figure: "sketch.png".to_string(),
            html: "note.html".to_string(),
            body: "Remember to water the plants.".to_string(),
        }
        .to_record("2026-08-25-10-00-00".to_string())
    }

    #[test]
    fn test_basename_replaces_spaces() {
        assert_eq!(derive_basename("My First Note"), "My_First_Note");
        assert_eq!(derive_basename("single"), "single");
        assert_eq!(derive_basename("two  spaces"), "two__spaces");
    }

    #[test]
    fn test_derived_filenames() {
        assert_eq!(record_filename("My First Note"), "My_First_Note.note");
        assert_eq!(text_filename("My First Note"), "My_First_Note.txt");
    }

    #[test]
    fn test_to_record_stamps_filename_and_time() {
        let rec = sample();
        assert_eq!(rec.filename, "My_First_Note.note");
        assert_eq!(rec.time, "2026-08-25-10-00-00");
        assert_eq!(rec.title, "My First Note");
    }

    #[test]
    fn test_render_text_field_order() {
        let text = sample().render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Filename: My_First_Note.txt");
        assert_eq!(lines[1], "Time: 2026-08-25-10-00-00");
        assert_eq!(lines[2], "Title: My First Note");
        assert_eq!(lines[3], "Keyword: rust, journal");
        assert_eq!(lines[4], "Figure: sketch.png");
        assert_eq!(lines[5], "HTML: note.html");
        assert_eq!(lines[6], "Body: Remember to water the plants.");
    }

    #[test]
    fn test_serialized_key_names() {
        let json = serde_json::to_string(&sample()).unwrap();
        for key in ["Filename", "Time", "Title", "Keyword", "Figure", "HTML", "Body"] {
            assert!(json.contains(&format!("\"{}\"", key)), "missing key {}", key);
        }
        // the rename must not leave the lowercase struct field names behind
        assert!(!json.contains("\"filename\""));
        assert!(!json.contains("\"html\""));
    }

    #[test]
    fn test_serde_round_trip() {
        let rec = sample();
        let json = serde_json::to_string(&rec).unwrap();
        let back: NoteRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_search_text_is_lowercased() {
        let rec = sample();
        assert_eq!(rec.search_text(), "my first note rust, journal");
    }

    #[test]
    fn test_timestamp_layout() {
        let ts = timestamp_now();
        // six dash-separated numeric groups
        let parts: Vec<&str> = ts.split('-').collect();
        assert_eq!(parts.len(), 6);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }
}
