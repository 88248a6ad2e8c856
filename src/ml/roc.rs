// ============================================================
// Layer 5 — ROC / AUC
// ============================================================
// One-vs-rest ROC curves and trapezoidal AUC.

/// Points of a receiver operating characteristic curve, from (0, 0) to (1, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve by the trapezoidal rule.
    pub fn auc(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
            .sum()
    }
}

/// ROC curve of `scores` against binary ground truth, with one point per
/// distinct score. `None` when the truth has no positives or no negatives.
pub fn roc_curve(truth: &[bool], scores: &[f64]) -> Option<RocCurve> {
    debug_assert_eq!(truth.len(), scores.len());

    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let (mut tp, mut fp) = (0usize, 0usize);

    for (rank, &i) in order.iter().enumerate() {
        if truth[i] { tp += 1 } else { fp += 1 }

        // emit a point only once all samples tied at this score are counted
        let last_of_tie = order
            .get(rank + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_tie {
            fpr.push(fp as f64 / negatives as f64);
            tpr.push(tp as f64 / positives as f64);
        }
    }

    Some(RocCurve { fpr, tpr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_ranking_has_auc_one() {
        let curve = roc_curve(&[true, true, false, false], &[0.9, 0.8, 0.3, 0.1]).unwrap();
        assert!((curve.auc() - 1.0).abs() < 1e-12);
        assert_eq!(curve.fpr.first(), Some(&0.0));
        assert_eq!(curve.tpr.last(), Some(&1.0));
    }

    #[test]
    fn test_inverted_ranking_has_auc_zero() {
        let curve = roc_curve(&[false, false, true, true], &[0.9, 0.8, 0.3, 0.1]).unwrap();
        assert!(curve.auc().abs() < 1e-12);
    }

    #[test]
    fn test_constant_scores_give_diagonal() {
        let curve = roc_curve(&[true, false, true, false, false], &[0.2; 5]).unwrap();
        assert_eq!(curve.fpr, vec![0.0, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 1.0]);
        assert!((curve.auc() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_known_value() {
        // sklearn.metrics.roc_auc_score([0, 0, 1, 1], [0.1, 0.4, 0.35, 0.8]) == 0.75
        let curve = roc_curve(&[false, false, true, true], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!((curve.auc() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_truth_is_undefined() {
        assert!(roc_curve(&[true, true], &[0.1, 0.2]).is_none());
        assert!(roc_curve(&[false, false], &[0.1, 0.2]).is_none());
    }
}
