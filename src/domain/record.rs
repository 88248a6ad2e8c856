// ============================================================
// Layer 3 — Raw Labeled Record
// ============================================================
// One item of the labeling-tool export: a free-text title and
// the category an annotator assigned to it. No validation
// happens here; the data preparer decides what is usable.
//
// `export_index` is the item's position in the export file,
// counted before any malformed item is skipped. Records built
// in memory have none.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title:    String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_index: Option<usize>,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title:    title.into(),
            category: category.into(),
            export_index: None,
        }
    }

    pub fn at(mut self, export_index: usize) -> Self {
        self.export_index = Some(export_index);
        self
    }

    /// True when the title has no visible characters.
    pub fn has_blank_title(&self) -> bool {
        self.title.trim().is_empty()
    }
}
