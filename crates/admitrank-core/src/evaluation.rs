//! Ranking-quality and classification metrics.
//!
//! Relevance is binary: an item is relevant iff its identifier is in the
//! ground-truth set. Position discounting uses `1 / log2(i + 2)` with a
//! 0-based position `i`. An item repeated in a ranking only counts the
//! first time it appears.
//!
//! | Metric       | Measures                                        |
//! |--------------|-------------------------------------------------|
//! | Precision@k  | share of the top k that is relevant             |
//! | Recall@k     | share of the relevant set found in the top k    |
//! | NDCG@k       | position-discounted gain over the ideal ranking |
//! | MRR          | reciprocal rank of the first relevant item      |
//! | MAP@k        | mean of per-query average precision             |
//! | F1@k         | harmonic mean of precision@k and recall@k       |

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, AdvisorResult};

/// Cutoffs used when the caller does not pick any.
pub const DEFAULT_K_VALUES: [usize; 3] = [1, 5, 10];

fn truth_set<T: Eq + Hash>(truth: &[T]) -> HashSet<&T> {
    truth.iter().collect()
}

/// Distinct relevant items among the first `k` recommendations.
fn hits_at_k<T: Eq + Hash>(recs: &[T], truth: &HashSet<&T>, k: usize) -> usize {
    let mut seen = HashSet::new();
    recs.iter()
        .take(k)
        .filter(|item| truth.contains(item) && seen.insert(*item))
        .count()
}

fn discount(position: usize) -> f64 {
    1.0 / ((position + 2) as f64).log2()
}

/// `|recs[:k] ∩ truth| / k`; zero when `k` is zero.
pub fn precision_at_k<T: Eq + Hash>(recs: &[T], truth: &[T], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits_at_k(recs, &truth_set(truth), k) as f64 / k as f64
}

/// `|recs[:k] ∩ truth| / |truth|`; zero when the truth is empty.
pub fn recall_at_k<T: Eq + Hash>(recs: &[T], truth: &[T], k: usize) -> f64 {
    let truth = truth_set(truth);
    if truth.is_empty() {
        return 0.0;
    }
    hits_at_k(recs, &truth, k) as f64 / truth.len() as f64
}

/// Normalized discounted cumulative gain over `(item, score)` pairs in
/// recommendation order. The scores are carried for the caller and do not
/// affect the metric.
pub fn ndcg_at_k<T: Eq + Hash>(ranked: &[(T, f64)], truth: &[T], k: usize) -> f64 {
    let truth = truth_set(truth);

    let mut seen = HashSet::new();
    let dcg: f64 = ranked
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, (item, _))| truth.contains(item) && seen.insert(item))
        .map(|(i, _)| discount(i))
        .sum();

    let idcg: f64 = (0..truth.len().min(k)).map(discount).sum();

    if idcg == 0.0 {
        return 0.0;
    }
    dcg / idcg
}

/// Reciprocal of the 1-based rank of the first relevant item.
pub fn mrr<T: Eq + Hash>(recs: &[T], truth: &[T]) -> f64 {
    let truth = truth_set(truth);
    recs.iter()
        .position(|item| truth.contains(item))
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}

/// Average precision of one query over its top `k`.
///
/// `None` when the truth is empty, so callers can skip the query.
pub fn average_precision<T: Eq + Hash>(recs: &[T], truth: &[T], k: usize) -> Option<f64> {
    let truth = truth_set(truth);
    if truth.is_empty() {
        return None;
    }

    let mut seen = HashSet::new();
    let mut hits = 0usize;
    let mut precision_sum = 0.0;
    for (i, item) in recs.iter().take(k).enumerate() {
        if truth.contains(item) && seen.insert(item) {
            hits += 1;
            precision_sum += hits as f64 / (i + 1) as f64;
        }
    }

    Some(precision_sum / truth.len() as f64)
}

/// Mean average precision across queries, skipping queries with empty
/// truth. Zero when no query qualifies.
pub fn map_score<T: Eq + Hash>(
    all_recs: &[Vec<T>],
    all_truths: &[Vec<T>],
    k: usize,
) -> AdvisorResult<f64> {
    if all_recs.len() != all_truths.len() {
        return Err(AdvisorError::LengthMismatch {
            left: all_recs.len(),
            right: all_truths.len(),
        });
    }

    let precisions: Vec<f64> = all_recs
        .iter()
        .zip(all_truths)
        .filter_map(|(recs, truth)| average_precision(recs, truth, k))
        .collect();

    Ok(mean(&precisions))
}

/// Harmonic mean of precision@k and recall@k.
pub fn f1_score<T: Eq + Hash>(recs: &[T], truth: &[T], k: usize) -> f64 {
    let precision = precision_at_k(recs, truth, k);
    let recall = recall_at_k(recs, truth, k);
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn resolve_k_values(k_values: Option<&[usize]>) -> Vec<usize> {
    match k_values {
        Some(ks) if !ks.is_empty() => ks.to_vec(),
        _ => DEFAULT_K_VALUES.to_vec(),
    }
}

/// Ranking metrics for one recommendation list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub precision_at_k: BTreeMap<usize, f64>,
    pub recall_at_k: BTreeMap<usize, f64>,
    pub ndcg: f64,
    pub mrr: f64,
    pub map_score: f64,
    pub f1_score: f64,
}

/// Evaluate one ranked list against its ground truth.
///
/// Precision and recall are reported at every cutoff; NDCG, MAP and F1
/// use the largest cutoff.
pub fn evaluate<T: Eq + Hash + Clone>(
    ranked: &[(T, f64)],
    truth: &[T],
    k_values: Option<&[usize]>,
) -> EvaluationMetrics {
    let k_values = resolve_k_values(k_values);
    let horizon = k_values.iter().copied().max().unwrap_or(0);
    let ids: Vec<T> = ranked.iter().map(|(id, _)| id.clone()).collect();

    let precision_at_k = k_values
        .iter()
        .map(|&k| (k, precision_at_k(&ids, truth, k)))
        .collect();
    let recall_at_k = k_values
        .iter()
        .map(|&k| (k, recall_at_k(&ids, truth, k)))
        .collect();

    EvaluationMetrics {
        precision_at_k,
        recall_at_k,
        ndcg: ndcg_at_k(ranked, truth, horizon),
        mrr: mrr(&ids, truth),
        map_score: average_precision(&ids, truth, horizon).unwrap_or(0.0),
        f1_score: f1_score(&ids, truth, horizon),
    }
}

// ---------------------------------------------------------------------------
// Logged evaluation runs
// ---------------------------------------------------------------------------

/// One recommended item as it was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedRecommendation {
    pub id: String,
    #[serde(default)]
    pub score: f64,
}

/// A recommendation list paired with the items that turned out relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLog {
    pub query_id: String,
    /// Recommendations in the order they were shown.
    pub recommendations: Vec<LoggedRecommendation>,
    #[serde(default)]
    pub ground_truth: Vec<String>,
}

/// Binary admission predictions paired with outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationLog {
    pub predictions: Vec<u8>,
    pub ground_truth: Vec<u8>,
}

/// A batch of historical outcomes to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationLog {
    pub name: String,
    #[serde(default)]
    pub queries: Vec<QueryLog>,
    #[serde(default)]
    pub classification: Option<ClassificationLog>,
}

/// Metrics for one logged query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub query_id: String,
    pub metrics: EvaluationMetrics,
}

/// Means across every query in a log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub query_count: usize,
    pub k_values: Vec<usize>,
    pub precision_at_k: BTreeMap<usize, f64>,
    pub recall_at_k: BTreeMap<usize, f64>,
    pub ndcg: f64,
    pub mrr: f64,
    /// MAP over queries with a non-empty ground truth.
    pub map_score: f64,
    pub f1_score: f64,
}

/// Evaluate every query of a log and summarize.
pub fn evaluate_log(
    log: &EvaluationLog,
    k_values: Option<&[usize]>,
) -> (Vec<QueryMetrics>, EvaluationSummary) {
    let k_values = resolve_k_values(k_values);
    let horizon = k_values.iter().copied().max().unwrap_or(0);

    let per_query: Vec<QueryMetrics> = log
        .queries
        .iter()
        .map(|q| {
            let ranked: Vec<(String, f64)> = q
                .recommendations
                .iter()
                .map(|r| (r.id.clone(), r.score))
                .collect();
            QueryMetrics {
                query_id: q.query_id.clone(),
                metrics: evaluate(&ranked, &q.ground_truth, Some(k_values.as_slice())),
            }
        })
        .collect();

    let precision_at_k = k_values
        .iter()
        .map(|&k| (k, mean_of(&per_query, |m| m.precision_at_k.get(&k).copied())))
        .collect();
    let recall_at_k = k_values
        .iter()
        .map(|&k| (k, mean_of(&per_query, |m| m.recall_at_k.get(&k).copied())))
        .collect();

    let precisions: Vec<f64> = log
        .queries
        .iter()
        .filter_map(|q| {
            let ids: Vec<&str> = q.recommendations.iter().map(|r| r.id.as_str()).collect();
            let truth: Vec<&str> = q.ground_truth.iter().map(String::as_str).collect();
            average_precision(&ids, &truth, horizon)
        })
        .collect();

    let summary = EvaluationSummary {
        query_count: per_query.len(),
        k_values: k_values.clone(),
        precision_at_k,
        recall_at_k,
        ndcg: mean_of(&per_query, |m| Some(m.ndcg)),
        mrr: mean_of(&per_query, |m| Some(m.mrr)),
        map_score: mean(&precisions),
        f1_score: mean_of(&per_query, |m| Some(m.f1_score)),
    };

    (per_query, summary)
}

fn mean_of(
    per_query: &[QueryMetrics],
    pick: impl Fn(&EvaluationMetrics) -> Option<f64>,
) -> f64 {
    let values: Vec<f64> = per_query.iter().filter_map(|q| pick(&q.metrics)).collect();
    mean(&values)
}

// ---------------------------------------------------------------------------
// Binary classification
// ---------------------------------------------------------------------------

/// Counts of a binary confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }
}

fn check_pairs(truth: &[u8], predictions: &[u8]) -> AdvisorResult<()> {
    if truth.len() != predictions.len() {
        return Err(AdvisorError::LengthMismatch {
            left: truth.len(),
            right: predictions.len(),
        });
    }
    if let Some(bad) = truth.iter().chain(predictions).find(|&&v| v > 1) {
        return Err(AdvisorError::invalid(format!(
            "binary labels must be 0 or 1, got {bad}"
        )));
    }
    Ok(())
}

/// Tally predictions against outcomes. Outcomes come first.
pub fn confusion_matrix(truth: &[u8], predictions: &[u8]) -> AdvisorResult<ConfusionMatrix> {
    check_pairs(truth, predictions)?;
    let mut cm = ConfusionMatrix::default();
    for (&g, &p) in truth.iter().zip(predictions) {
        match (p, g) {
            (1, 1) => cm.true_positives += 1,
            (0, 0) => cm.true_negatives += 1,
            (1, 0) => cm.false_positives += 1,
            _ => cm.false_negatives += 1,
        }
    }
    Ok(cm)
}

/// Share of predictions equal to the outcome; zero for empty input.
pub fn accuracy(truth: &[u8], predictions: &[u8]) -> AdvisorResult<f64> {
    check_pairs(truth, predictions)?;
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let correct = truth.iter().zip(predictions).filter(|(g, p)| g == p).count();
    Ok(correct as f64 / predictions.len() as f64)
}

/// `tp / (tp + fp)`, zero when nothing was predicted positive.
pub fn precision(truth: &[u8], predictions: &[u8]) -> AdvisorResult<f64> {
    let cm = confusion_matrix(truth, predictions)?;
    Ok(ratio(cm.true_positives, cm.true_positives + cm.false_positives))
}

/// `tp / (tp + fn)`, zero when there were no positive outcomes.
pub fn recall(truth: &[u8], predictions: &[u8]) -> AdvisorResult<f64> {
    let cm = confusion_matrix(truth, predictions)?;
    Ok(ratio(cm.true_positives, cm.true_positives + cm.false_negatives))
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Confusion matrix together with the derived rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

pub fn classification_report(
    truth: &[u8],
    predictions: &[u8],
) -> AdvisorResult<ClassificationMetrics> {
    let confusion = confusion_matrix(truth, predictions)?;
    let total = confusion.total();
    Ok(ClassificationMetrics {
        confusion,
        accuracy: ratio(confusion.true_positives + confusion.true_negatives, total),
        precision: ratio(
            confusion.true_positives,
            confusion.true_positives + confusion.false_positives,
        ),
        recall: ratio(
            confusion.true_positives,
            confusion.true_positives + confusion.false_negatives,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn precision_recall_f1_example() {
        let recs = [1, 2, 3, 4, 5];
        let truth = [2, 4];
        assert!(close(precision_at_k(&recs, &truth, 5), 0.4));
        assert!(close(recall_at_k(&recs, &truth, 5), 1.0));
        let f1 = f1_score(&recs, &truth, 5);
        assert!((f1 - 0.5714).abs() < 1e-4, "got {f1}");
    }

    #[test]
    fn degenerate_cutoffs_and_truth() {
        assert_eq!(precision_at_k(&[1, 2], &[1], 0), 0.0);
        assert_eq!(recall_at_k::<i32>(&[1, 2], &[], 2), 0.0);
        assert_eq!(f1_score(&[7, 8], &[1], 2), 0.0);
        assert_eq!(ndcg_at_k::<i32>(&[(1, 0.9)], &[], 5), 0.0);
        assert_eq!(ndcg_at_k(&[(1, 0.9)], &[1], 0), 0.0);
        assert_eq!(precision_at_k::<i32>(&[], &[1], 3), 0.0);
    }

    #[test]
    fn precision_divides_by_k_even_when_list_is_short() {
        assert!(close(precision_at_k(&["a"], &["a"], 4), 0.25));
    }

    #[test]
    fn repeated_items_count_once() {
        let recs = ["a", "a", "a"];
        assert!(close(precision_at_k(&recs, &["a"], 3), 1.0 / 3.0));
        let ranked = [("a", 0.9), ("a", 0.8)];
        assert!(close(ndcg_at_k(&ranked, &["a"], 2), 1.0));
    }

    #[test]
    fn mrr_first_hit_position() {
        assert!(close(mrr(&[5, 2, 9], &[2, 9]), 0.5));
        assert!(close(mrr(&[2, 5], &[2]), 1.0));
        assert_eq!(mrr(&[1, 3], &[2]), 0.0);
    }

    #[test]
    fn ndcg_perfect_ranking_any_order() {
        let truth = ["x", "y", "z"];
        for order in [["x", "y", "z"], ["z", "x", "y"], ["y", "z", "x"]] {
            let ranked: Vec<(&str, f64)> = order
                .iter()
                .enumerate()
                .map(|(i, id)| (*id, 1.0 - i as f64 * 0.1))
                .collect();
            assert!(close(ndcg_at_k(&ranked, &truth, 3), 1.0));
        }
    }

    #[test]
    fn ndcg_discounts_late_hits() {
        // single relevant item at 0-based position 1: (1/log2(3)) / 1
        let ranked = [("a", 0.9), ("b", 0.8), ("c", 0.7)];
        let expected = 1.0 / 3f64.log2();
        assert!(close(ndcg_at_k(&ranked, &["b"], 3), expected));
    }

    #[test]
    fn ndcg_ideal_is_capped_by_k() {
        // 3 relevant items, k = 2, both top slots relevant
        let ranked = [("a", 0.0), ("b", 0.0), ("c", 0.0)];
        assert!(close(ndcg_at_k(&ranked, &["a", "b", "c"], 2), 1.0));
    }

    #[test]
    fn map_averages_queries_and_skips_empty_truth() {
        let recs = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8]];
        let truths = vec![vec![1, 3], vec![6], vec![]];
        // q1: (1/1 + 2/3) / 2 = 0.8333; q2: (1/3) / 1; q3 skipped
        let expected = ((1.0 + 2.0 / 3.0) / 2.0 + 1.0 / 3.0) / 2.0;
        assert!(close(map_score(&recs, &truths, 10).unwrap(), expected));
    }

    #[test]
    fn map_without_qualifying_queries_is_zero() {
        let recs: Vec<Vec<u32>> = vec![vec![1]];
        let truths: Vec<Vec<u32>> = vec![vec![]];
        assert_eq!(map_score(&recs, &truths, 5).unwrap(), 0.0);
        assert_eq!(map_score::<u32>(&[], &[], 5).unwrap(), 0.0);
    }

    #[test]
    fn map_rejects_unpaired_queries() {
        let err = map_score(&[vec![1]], &[vec![1], vec![2]], 5).unwrap_err();
        assert_eq!(err, AdvisorError::LengthMismatch { left: 1, right: 2 });
    }

    #[test]
    fn evaluate_reports_every_cutoff() {
        let ranked = [("a", 0.9), ("b", 0.8), ("c", 0.7), ("d", 0.6), ("e", 0.5)];
        let truth = ["b", "e"];
        let metrics = evaluate(&ranked, &truth, None);

        assert_eq!(metrics.precision_at_k.keys().copied().collect::<Vec<_>>(), vec![1, 5, 10]);
        assert_eq!(metrics.precision_at_k[&1], 0.0);
        assert!(close(metrics.precision_at_k[&5], 0.4));
        assert!(close(metrics.recall_at_k[&10], 1.0));
        assert!(close(metrics.mrr, 0.5));
        assert!(metrics.ndcg > 0.0 && metrics.ndcg < 1.0);
        // hits at positions 2 and 5: (1/2 + 2/5) / 2
        assert!(close(metrics.map_score, 0.45));
    }

    #[test]
    fn evaluate_log_summarizes_queries() {
        let log = EvaluationLog {
            name: "fall intake".into(),
            queries: vec![
                QueryLog {
                    query_id: "q1".into(),
                    recommendations: vec![
                        LoggedRecommendation { id: "tum".into(), score: 0.9 },
                        LoggedRecommendation { id: "eth".into(), score: 0.8 },
                    ],
                    ground_truth: vec!["tum".into()],
                },
                QueryLog {
                    query_id: "q2".into(),
                    recommendations: vec![LoggedRecommendation { id: "kth".into(), score: 0.4 }],
                    ground_truth: vec![],
                },
            ],
            classification: None,
        };

        let (per_query, summary) = evaluate_log(&log, Some(&[1, 2][..]));
        assert_eq!(per_query.len(), 2);
        assert_eq!(summary.query_count, 2);
        assert_eq!(summary.k_values, vec![1, 2]);
        assert!(close(summary.mrr, 0.5));
        assert!(close(summary.precision_at_k[&1], 0.5));
        // only q1 has a ground truth
        assert!(close(summary.map_score, 1.0));
    }

    #[test]
    fn confusion_matrix_example() {
        let cm = confusion_matrix(&[1, 0, 1, 1], &[1, 0, 0, 1]).unwrap();
        assert_eq!(
            cm,
            ConfusionMatrix {
                true_positives: 2,
                true_negatives: 1,
                false_positives: 0,
                false_negatives: 1,
            }
        );
        assert!(close(accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]).unwrap(), 0.75));
    }

    #[test]
    fn classification_rates() {
        let preds = [1, 1, 0, 0, 1];
        let truth = [1, 0, 1, 0, 1];
        assert!(close(precision(&truth, &preds).unwrap(), 2.0 / 3.0));
        assert!(close(recall(&truth, &preds).unwrap(), 2.0 / 3.0));

        let report = classification_report(&truth, &preds).unwrap();
        assert!(close(report.accuracy, 0.6));
        assert_eq!(report.confusion.total(), 5);

        assert_eq!(precision(&[0, 0], &[1, 0]).unwrap(), 0.0);
        assert_eq!(recall(&[1, 1], &[1, 0]).unwrap(), 0.5);
        assert_eq!(recall(&[0, 0], &[0, 0]).unwrap(), 0.0);
        assert_eq!(accuracy(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn classification_rejects_bad_input() {
        assert!(matches!(
            confusion_matrix(&[1, 0], &[1]),
            Err(AdvisorError::LengthMismatch { left: 2, right: 1 })
        ));
        assert!(accuracy(&[1], &[1, 0]).is_err());
        assert!(matches!(
            confusion_matrix(&[2], &[1]),
            Err(AdvisorError::InvalidInput(_))
        ));
    }
}
