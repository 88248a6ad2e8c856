// ============================================================
// Layer 3 — Observations
// ============================================================
// Non-fatal events worth surfacing to whoever invoked the run:
// unknown categories, skipped records, registry conflicts and
// classes whose AUC cannot be computed.
//
// Each observation is kept in memory (so tests and the CLI can
// inspect it) and mirrored to the tracing log at WARN level.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    UnknownCategory { index: usize, category: String, mapped_to: String },
    MalformedRecord { index: usize, reason: String },
    RegistryConflict { model: String, uri: String },
    UndefinedAuc { label: String },
}

#[derive(Debug, Default, Clone)]
pub struct Observations {
    items: Vec<Observation>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, obs: Observation) {
        match &obs {
            Observation::UnknownCategory { index, category, mapped_to } => {
                tracing::warn!(index, category = %category, mapped_to = %mapped_to, "unknown category");
            }
            Observation::MalformedRecord { index, reason } => {
                tracing::warn!(index, reason = %reason, "skipping malformed record");
            }
            Observation::RegistryConflict { model, uri } => {
                tracing::warn!(model = %model, uri = %uri, "model version already registered");
            }
            Observation::UndefinedAuc { label } => {
                tracing::warn!(label = %label, "AUC undefined for class (single-valued ground truth)");
            }
        }
        self.items.push(obs);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unknown_categories(&self) -> usize {
        self.items
            .iter()
            .filter(|o| matches!(o, Observation::UnknownCategory { .. }))
            .count()
    }
}
