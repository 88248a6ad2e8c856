// ============================================================
// Layer 4 — Data Preparer
// ============================================================
// Turns raw records into model-ready samples:
//
//   1. Drop records whose title is empty or whitespace-only
//      (silently; this is not an error).
//   2. Resolve the category through the label vocabulary.
//      Unknown categories get the catch-all id and produce an
//      UnknownCategory observation.
//   3. Encode the title, truncate to max_length, pad with
//      [PAD] = 0 and build the matching attention mask.
//
// Given the same records, tokenizer and max_length the output
// is identical bit for bit. Zero usable samples is fatal.

use tokenizers::Tokenizer;

use crate::data::dataset::ClassificationSample;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::labels::{LabelLookup, LabelVocabulary};
use crate::domain::observation::{Observation, Observations};
use crate::domain::record::RawRecord;
use crate::infra::tokenizer_store::PAD_ID;

/// A title with its resolved label id, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledText {
    pub text:  String,
    pub label: usize,
}

/// Steps 1 and 2: filter blank titles and map categories to ids.
pub fn select_examples(
    records:      &[RawRecord],
    vocab:        &LabelVocabulary,
    observations: &mut Observations,
) -> Vec<LabeledText> {
    let mut out = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if record.has_blank_title() {
            continue;
        }
        let lookup = vocab.resolve(&record.category);
        if let LabelLookup::Fallback(id) = lookup {
            observations.record(Observation::UnknownCategory {
                index:     record.export_index.unwrap_or(index),
                category:  record.category.clone(),
                mapped_to: vocab.name(id).unwrap_or_default().to_string(),
            });
        }
        out.push(LabeledText { text: record.title.trim().to_string(), label: lookup.id() });
    }
    out
}

pub struct DataPreparer<'a> {
    vocab:      &'a LabelVocabulary,
    tokenizer:  &'a Tokenizer,
    max_length: usize,
}

impl<'a> DataPreparer<'a> {
    pub fn new(vocab: &'a LabelVocabulary, tokenizer: &'a Tokenizer, max_length: usize) -> Self {
        Self { vocab, tokenizer, max_length }
    }

    pub fn prepare(
        &self,
        records:      &[RawRecord],
        observations: &mut Observations,
    ) -> PipelineResult<Vec<ClassificationSample>> {
        let examples = select_examples(records, self.vocab, observations);
        if examples.is_empty() {
            return Err(PipelineError::data_format(format!(
                "no usable examples among {} records",
                records.len()
            )));
        }

        let samples = examples
            .iter()
            .map(|ex| {
                let (input_ids, attention_mask) = self.encode(&ex.text)?;
                Ok(ClassificationSample { input_ids, attention_mask, label: ex.label })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        tracing::info!(
            "Prepared {} examples from {} records ({} unknown categories)",
            samples.len(),
            records.len(),
            observations.unknown_categories(),
        );
        Ok(samples)
    }

    /// Fixed-length token ids and attention mask for one text.
    pub fn encode(&self, text: &str) -> PipelineResult<(Vec<u32>, Vec<u32>)> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| PipelineError::Tokenizer(format!("cannot encode '{text}': {e}")))?;

        let mut ids: Vec<u32> = enc.get_ids().to_vec();
        ids.truncate(self.max_length);

        let mut mask = vec![1u32; ids.len()];
        ids.resize(self.max_length, PAD_ID);
        mask.resize(self.max_length, 0);

        Ok((ids, mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::build_tokenizer;
    use crate::test_support::notice_snapshot as snapshot;

    #[test]
    fn test_snapshot_yields_19_examples_with_two_fallbacks() {
        let vocab   = LabelVocabulary::default();
        let records = snapshot();
        let texts: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        let tok     = build_tokenizer(&texts, 512).unwrap();
        let mut obs = Observations::new();

        let samples = DataPreparer::new(&vocab, &tok, 16).prepare(&records, &mut obs).unwrap();

        assert_eq!(samples.len(), 19);
        assert_eq!(obs.unknown_categories(), 2);
        assert_eq!(samples[17].label, vocab.fallback_id());
        assert_eq!(samples[18].label, vocab.fallback_id());
        let mapped: Vec<&str> = obs
            .iter()
            .filter_map(|o| match o {
                Observation::UnknownCategory { category, .. } => Some(category.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(mapped, vec!["体育活动", "文艺活动"]);
    }

    #[test]
    fn test_blank_titles_are_dropped_silently() {
        let vocab   = LabelVocabulary::default();
        let records = vec![
            RawRecord::new("", "未知"),
            RawRecord::new("\t \n", "其他"),
            RawRecord::new("讲座", "学术活动"),
        ];
        let mut obs  = Observations::new();
        let examples = select_examples(&records, &vocab, &mut obs);
        assert_eq!(examples, vec![LabeledText { text: "讲座".into(), label: 1 }]);
        // blank titles never reach category resolution
        assert!(obs.is_empty());
    }

    #[test]
    fn test_unknown_category_reports_export_position() {
        let vocab   = LabelVocabulary::default();
        let mut obs = Observations::new();
        let text    = r#"[42, {"title": "歌手大赛", "category": "文艺活动"}]"#;
        let records = crate::data::loader::parse_export(text, &mut obs).unwrap();

        select_examples(&records, &vocab, &mut obs);

        let index = obs.iter().find_map(|o| match o {
            Observation::UnknownCategory { index, .. } => Some(*index),
            _ => None,
        });
        // item 0 was malformed and skipped; the unknown one is still item 1
        assert_eq!(index, Some(1));
    }

    #[test]
    fn test_zero_usable_examples_is_fatal() {
        let vocab = LabelVocabulary::default();
        let tok   = build_tokenizer(&[], 16).unwrap();
        let err   = DataPreparer::new(&vocab, &tok, 8)
            .prepare(&[RawRecord::new(" ", "其他")], &mut Observations::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(_)));
    }

    #[test]
    fn test_encoding_pads_and_truncates() {
        let vocab = LabelVocabulary::default();
        let tok   = build_tokenizer(&["a b c d e f".to_string()], 32).unwrap();
        let prep  = DataPreparer::new(&vocab, &tok, 4);

        let (ids, mask) = prep.encode("a b").unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(&ids[2..], &[PAD_ID, PAD_ID]);
        assert_eq!(mask, vec![1, 1, 0, 0]);

        let (ids, mask) = prep.encode("a b c d e f").unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_preparation_is_reproducible() {
        let vocab   = LabelVocabulary::default();
        let records = snapshot();
        let texts: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        let tok     = build_tokenizer(&texts, 512).unwrap();
        let prep    = DataPreparer::new(&vocab, &tok, 12);

        let one = prep.prepare(&records, &mut Observations::new()).unwrap();
        let two = prep.prepare(&records, &mut Observations::new()).unwrap();
        assert_eq!(one, two);
    }
}
