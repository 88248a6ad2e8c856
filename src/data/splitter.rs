// ============================================================
// Layer 4 — Train / Held-out Splitter
// ============================================================
// Shuffles samples with a seeded RNG and splits off a held-out
// evaluation set.
//
// A holdout fraction of 0.0 is the no-holdout compatibility
// mode: nothing is shuffled or split and the caller evaluates
// on the training set itself, which reproduces historical runs.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom, seeded
// so the same snapshot and seed always produce the same split.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Split `samples` into (train, holdout).
pub fn split_holdout<T>(mut samples: Vec<T>, holdout_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    if holdout_fraction <= 0.0 || samples.is_empty() {
        return (samples, Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let holdout  = ((total as f64) * holdout_fraction).round() as usize;
    // keep at least one training sample
    let split_at = total - holdout.min(total.saturating_sub(1));

    let held_out = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} held out",
        samples.len(),
        held_out.len(),
    );

    (samples, held_out)
}
