//! Descriptive statistics over a catalog and over recommendation runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cost::round_dp;
use crate::error::{AdvisorError, AdvisorResult};
use crate::model::CandidateRecord;

/// Match percentage at or above which a recommendation counts as high quality.
pub const HIGH_QUALITY_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; zero for a single value.
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingStats {
    pub mean: f64,
    pub median: f64,
    pub best: u32,
    pub worst: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipStats {
    pub with_scholarships: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub total_candidates: usize,
    /// `None` when no candidate charges tuition.
    pub cost: Option<CostStats>,
    pub ranking: Option<RankingStats>,
    pub scholarships: ScholarshipStats,
    pub total_programs: usize,
    pub country_distribution: BTreeMap<String, usize>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a non-empty slice.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn cost_stats(fees: &[f64]) -> Option<CostStats> {
    if fees.is_empty() {
        return None;
    }
    Some(CostStats {
        mean: round_dp(mean(fees), 2),
        median: round_dp(median(fees), 2),
        min: fees.iter().copied().fold(f64::INFINITY, f64::min),
        max: fees.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std_dev: round_dp(sample_std_dev(fees), 2),
    })
}

fn ranking_stats(rankings: &[u32]) -> Option<RankingStats> {
    let best = rankings.iter().copied().min()?;
    let worst = rankings.iter().copied().max()?;
    let as_f64: Vec<f64> = rankings.iter().map(|&r| f64::from(r)).collect();
    Some(RankingStats {
        mean: round_dp(mean(&as_f64), 1),
        median: round_dp(median(&as_f64), 1),
        best,
        worst,
    })
}

/// Aggregate statistics over a catalog. Free programs are left out of
/// the cost statistics.
pub fn summarize_catalog(candidates: &[CandidateRecord]) -> CatalogSummary {
    let fees: Vec<f64> = candidates
        .iter()
        .map(|c| c.tuition_fee)
        .filter(|&fee| fee > 0.0)
        .collect();
    let rankings: Vec<u32> = candidates.iter().map(|c| c.ranking).collect();

    let with_scholarships = candidates.iter().filter(|c| c.scholarship_available).count();
    let percentage = if candidates.is_empty() {
        0.0
    } else {
        round_dp(with_scholarships as f64 / candidates.len() as f64 * 100.0, 1)
    };

    let mut country_distribution = BTreeMap::new();
    for c in candidates {
        let country = match c.country.trim() {
            "" => "Unknown".to_string(),
            name => name.to_string(),
        };
        *country_distribution.entry(country).or_insert(0) += 1;
    }

    CatalogSummary {
        total_candidates: candidates.len(),
        cost: cost_stats(&fees),
        ranking: ranking_stats(&rankings),
        scholarships: ScholarshipStats {
            with_scholarships,
            percentage,
        },
        total_programs: candidates.iter().map(|c| c.programs.len()).sum(),
        country_distribution,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuitionRange {
    pub min: f64,
    pub max: f64,
}

/// Side-by-side metrics for a hand-picked set of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateComparison {
    pub candidates_compared: usize,
    pub tuition_range: TuitionRange,
    /// Rankings of the compared candidates, best first.
    pub rankings: Vec<u32>,
    /// Lowest tuition; the first such candidate on ties.
    pub cheapest: String,
    /// Lowest ranking number; the first such candidate on ties.
    pub best_ranked: String,
}

/// Compare two or more candidates on tuition and ranking.
pub fn compare_candidates(candidates: &[&CandidateRecord]) -> AdvisorResult<CandidateComparison> {
    let (first, rest) = match candidates {
        [first, rest @ ..] if !rest.is_empty() => (*first, rest),
        _ => {
            return Err(AdvisorError::invalid(
                "need at least 2 candidates to compare",
            ))
        }
    };

    let mut cheapest = first;
    let mut best_ranked = first;
    let mut range = TuitionRange {
        min: first.tuition_fee,
        max: first.tuition_fee,
    };
    for &c in rest {
        if c.tuition_fee < cheapest.tuition_fee {
            cheapest = c;
        }
        if c.ranking < best_ranked.ranking {
            best_ranked = c;
        }
        range.min = range.min.min(c.tuition_fee);
        range.max = range.max.max(c.tuition_fee);
    }

    let mut rankings: Vec<u32> = candidates.iter().map(|c| c.ranking).collect();
    rankings.sort_unstable();

    Ok(CandidateComparison {
        candidates_compared: candidates.len(),
        tuition_range: range,
        rankings,
        cheapest: cheapest.id.clone(),
        best_ranked: best_ranked.id.clone(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDistribution {
    /// `>= 90`
    pub excellent: usize,
    /// `[80, 90)`
    pub very_good: usize,
    /// `[70, 80)`
    pub good: usize,
    /// `< 70`
    pub acceptable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationQuality {
    pub total_recommendations: usize,
    pub average_match: f64,
    pub median_match: f64,
    pub high_quality_matches: usize,
    pub distribution: QualityDistribution,
}

/// Quality buckets over match percentages in `[0, 100]`. `None` for an
/// empty run.
pub fn recommendation_quality(match_percentages: &[f64]) -> Option<RecommendationQuality> {
    if match_percentages.is_empty() {
        return None;
    }

    let mut distribution = QualityDistribution::default();
    for &pct in match_percentages {
        match pct {
            p if p >= 90.0 => distribution.excellent += 1,
            p if p >= 80.0 => distribution.very_good += 1,
            p if p >= 70.0 => distribution.good += 1,
            _ => distribution.acceptable += 1,
        }
    }

    Some(RecommendationQuality {
        total_recommendations: match_percentages.len(),
        average_match: round_dp(mean(match_percentages), 1),
        median_match: round_dp(median(match_percentages), 1),
        high_quality_matches: match_percentages
            .iter()
            .filter(|&&p| p >= HIGH_QUALITY_THRESHOLD)
            .count(),
        distribution,
    })
}
