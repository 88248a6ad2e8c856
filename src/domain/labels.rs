// ============================================================
// Layer 3 — Label Vocabulary
// ============================================================
// A fixed, total mapping from category string to a contiguous
// label id. One entry is the catch-all: any category the
// vocabulary does not know resolves to it.
//
// The vocabulary is built once from configuration and handed to
// both the data preparer and the evaluator, so the number of
// classes seen during encoding and during AUC computation is
// always the same value.

use std::collections::HashMap;

use crate::domain::error::{PipelineError, PipelineResult};

/// Categories of the campus-notice dataset, in id order.
pub const DEFAULT_LABELS: [&str; 5] = ["放假通知", "学术活动", "行政通知", "招聘信息", "其他"];

/// Catch-all category of the default vocabulary.
pub const DEFAULT_FALLBACK: &str = "其他";

/// Result of resolving one category string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLookup {
    Known(usize),
    /// The category was not in the vocabulary; carries the catch-all id.
    Fallback(usize),
}

impl LabelLookup {
    pub fn id(self) -> usize {
        match self {
            LabelLookup::Known(id) | LabelLookup::Fallback(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    names:       Vec<String>,
    index:       HashMap<String, usize>,
    fallback_id: usize,
}

impl LabelVocabulary {
    /// Build a vocabulary from an ordered label list.
    /// Labels must be unique and non-empty; the fallback must be one of them.
    pub fn new<S: AsRef<str>>(labels: &[S], fallback: &str) -> PipelineResult<Self> {
        if labels.is_empty() {
            return Err(PipelineError::config("label vocabulary is empty"));
        }

        let mut names = Vec::with_capacity(labels.len());
        let mut index = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(PipelineError::config(format!("label #{id} is blank")));
            }
            if index.insert(label.to_string(), id).is_some() {
                return Err(PipelineError::config(format!("duplicate label '{label}'")));
            }
            names.push(label.to_string());
        }

        let fallback_id = *index.get(fallback.trim()).ok_or_else(|| {
            PipelineError::config(format!("fallback label '{fallback}' is not in the vocabulary"))
        })?;

        Ok(Self { names, index, fallback_id })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn fallback_id(&self) -> usize {
        self.fallback_id
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Total lookup: every input resolves to exactly one id.
    pub fn resolve(&self, category: &str) -> LabelLookup {
        match self.index.get(category.trim()) {
            Some(&id) => LabelLookup::Known(id),
            None      => LabelLookup::Fallback(self.fallback_id),
        }
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        let names: Vec<String> = DEFAULT_LABELS.iter().map(|s| s.to_string()).collect();
        let index = names.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
        Self { names, index, fallback_id: DEFAULT_LABELS.len() - 1 }
    }
}
