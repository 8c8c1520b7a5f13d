//! Deterministic ordering and filtering of scored candidates.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{same_country, CandidateRecord, ScoreComponents, ScoredCandidate, SortKey};

/// Orders scored candidates by a selectable key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker;

impl Ranker {
    /// Sort descending on `sort_key`, breaking ties by ascending id, then
    /// keep the first `top_k` entries when a limit is given.
    pub fn rank(
        &self,
        candidates: Vec<ScoredCandidate>,
        sort_key: SortKey,
        top_k: Option<usize>,
    ) -> Vec<ScoredCandidate> {
        self.rank_by(candidates, sort_key, top_k, |c| c)
    }

    /// Like [`Ranker::rank`], for items that carry a scored candidate
    /// alongside other data.
    pub fn rank_by<T>(
        &self,
        mut items: Vec<T>,
        sort_key: SortKey,
        top_k: Option<usize>,
        scored: impl Fn(&T) -> &ScoredCandidate,
    ) -> Vec<T> {
        items.sort_by(|a, b| compare(scored(a), scored(b), sort_key));
        if let Some(k) = top_k {
            items.truncate(k);
        }
        items
    }
}

fn compare(a: &ScoredCandidate, b: &ScoredCandidate, key: SortKey) -> Ordering {
    // adding 0.0 folds -0.0 into 0.0 so signed zeros tie
    let (va, vb) = (key.value(&a.components) + 0.0, key.value(&b.components) + 0.0);
    vb.total_cmp(&va)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// Optional hard constraints applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateFilter {
    /// Best (numerically lowest) ranking allowed.
    #[serde(default)]
    pub min_ranking: Option<u32>,
    /// Worst (numerically highest) ranking allowed.
    #[serde(default)]
    pub max_ranking: Option<u32>,
    /// Upper bound on tuition.
    #[serde(default)]
    pub max_tuition: Option<f64>,
    /// Only candidates in this country (case-insensitive).
    #[serde(default)]
    pub country: Option<String>,
    /// Only candidates offering scholarships.
    #[serde(default)]
    pub scholarship_required: bool,
    /// Minimum acceptance probability, in percent.
    #[serde(default)]
    pub min_acceptance_chance: Option<f64>,
}

impl CandidateFilter {
    pub fn is_empty(&self) -> bool {
        self == &CandidateFilter::default()
    }

    pub fn matches(&self, candidate: &CandidateRecord, score: &ScoreComponents) -> bool {
        if self.min_ranking.is_some_and(|min| candidate.ranking < min) {
            return false;
        }
        if self.max_ranking.is_some_and(|max| candidate.ranking > max) {
            return false;
        }
        if self.max_tuition.is_some_and(|max| candidate.tuition_fee > max) {
            return false;
        }
        if let Some(country) = self.country.as_deref().map(str::trim) {
            if !country.is_empty() && !same_country(country, &candidate.country) {
                return false;
            }
        }
        if self.scholarship_required && !candidate.scholarship_available {
            return false;
        }
        if self
            .min_acceptance_chance
            .is_some_and(|min| score.acceptance_probability < min)
        {
            return false;
        }
        true
    }
}
