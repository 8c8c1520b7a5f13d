//! Rule-based and hybrid candidate scoring.
//!
//! The rule scorer turns ranking, cost, program overlap and country
//! preference into a deterministic fit score. The hybrid scorer fuses it
//! with an admission-likelihood signal through a fixed convex combination:
//!
//! combined = w_ml * ml_score + w_rule * rule_score,  w_ml + w_rule = 1

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_non_negative, AdvisorError, AdvisorResult};
use crate::model::{
    same_country, CandidateRecord, ScoreComponents, StudentProfile, MAX_GPA, MAX_IELTS,
};

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Clip a score into `[0, 1]`.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Fusion weights for the hybrid score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    ml_weight: f64,
    rule_weight: f64,
}

impl ScoringWeights {
    /// Build weights, checking they are non-negative and sum to one.
    pub fn new(ml_weight: f64, rule_weight: f64) -> AdvisorResult<Self> {
        ensure_non_negative("ml_weight", ml_weight)?;
        ensure_non_negative("rule_weight", rule_weight)?;
        if ((ml_weight + rule_weight) - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AdvisorError::invalid(format!(
                "ml_weight + rule_weight must equal 1.0, got {}",
                ml_weight + rule_weight
            )));
        }
        Ok(Self {
            ml_weight,
            rule_weight,
        })
    }

    pub fn ml_weight(&self) -> f64 {
        self.ml_weight
    }

    pub fn rule_weight(&self) -> f64 {
        self.rule_weight
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            ml_weight: 0.6,
            rule_weight: 0.4,
        }
    }
}

/// Term weights for the rule score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleWeights {
    /// Starting score before any term is added.
    pub base: f64,
    /// Weight of the ranking term.
    pub ranking: f64,
    /// Weight of the cost term.
    pub cost: f64,
    /// Weight of the field/program overlap term.
    pub field: f64,
    /// Flat bonus when the preferred country matches.
    pub country: f64,
    /// Rankings at or beyond this number contribute nothing.
    pub ranking_horizon: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            ranking: 0.2,
            cost: 0.2,
            field: 0.2,
            country: 0.1,
            ranking_horizon: 500.0,
        }
    }
}

/// `1 - min(1, ranking / horizon)`: lower ranking numbers score higher.
pub fn ranking_component(ranking: u32, horizon: f64) -> f64 {
    1.0 - (ranking as f64 / horizon).min(1.0)
}

/// Cost term of the rule score. A zero budget means no limit.
pub fn cost_component(tuition: f64, budget: f64) -> f64 {
    if budget == 0.0 || tuition <= budget {
        1.0
    } else {
        (1.0 - (tuition - budget) / budget).max(0.0)
    }
}

/// How comfortably tuition fits the budget. A zero budget carries no
/// information and scores a neutral 0.5.
pub fn cost_fit(tuition: f64, budget: f64) -> f64 {
    if budget == 0.0 {
        return 0.5;
    }
    let fit = if tuition <= budget {
        (tuition / budget + 0.5).min(1.0)
    } else {
        (1.0 - (tuition - budget) / budget).max(0.0)
    };
    clamp_unit(fit)
}

/// GPA/IELTS heuristic used when no external signal is available.
pub fn fallback_signal(profile: &StudentProfile) -> f64 {
    let gpa_fit = (profile.gpa / MAX_GPA).min(1.0);
    let ielts_fit = (profile.ielts / MAX_IELTS).min(1.0);
    clamp_unit(0.6 * gpa_fit + 0.4 * ielts_fit)
}

fn check_inputs(candidate: &CandidateRecord, profile: &StudentProfile) -> AdvisorResult<()> {
    ensure_finite("gpa", profile.gpa)?;
    ensure_finite("ielts", profile.ielts)?;
    ensure_non_negative("budget", profile.budget)?;
    ensure_non_negative("tuition_fee", candidate.tuition_fee)
}

/// Deterministic fit score from normalized candidate and profile features.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScorer {
    weights: RuleWeights,
}

impl RuleScorer {
    pub fn new(weights: RuleWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RuleWeights {
        &self.weights
    }

    /// Score `candidate` against `profile`, clipped to `[0, 1]`.
    pub fn score(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> AdvisorResult<f64> {
        check_inputs(candidate, profile)?;
        let w = &self.weights;

        let mut score = w.base;
        score += w.ranking * ranking_component(candidate.ranking, w.ranking_horizon);
        score += w.cost * cost_component(candidate.tuition_fee, profile.budget);

        if let Some(field) = profile.field_of_study() {
            if let Some(overlap) = candidate.program_match(field) {
                score += w.field * overlap;
            }
        }

        if let Some(country) = profile.preferred_country() {
            if same_country(country, &candidate.country) {
                score += w.country;
            }
        }

        Ok(clamp_unit(score))
    }
}

/// Fuses an admission-likelihood signal with the rule score.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridScorer {
    weights: ScoringWeights,
    rules: RuleScorer,
}

impl HybridScorer {
    pub fn new(weights: ScoringWeights, rules: RuleScorer) -> Self {
        Self { weights, rules }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one candidate.
    ///
    /// `external_signal` must already be in `[0, 1]`; when it is `None`
    /// the GPA/IELTS heuristic stands in.
    pub fn score_candidate(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
        external_signal: Option<f64>,
    ) -> AdvisorResult<ScoreComponents> {
        check_inputs(candidate, profile)?;

        let ml_score = match external_signal {
            Some(signal) => {
                ensure_finite("external signal", signal)?;
                if !(0.0..=1.0).contains(&signal) {
                    return Err(AdvisorError::invalid(format!(
                        "external signal must be within [0, 1], got {signal}"
                    )));
                }
                // fold -0.0 into 0.0
                signal + 0.0
            }
            None => fallback_signal(profile),
        };

        let rule_score = self.rules.score(candidate, profile)?;
        let combined_score = clamp_unit(
            self.weights.ml_weight * ml_score + self.weights.rule_weight * rule_score,
        );

        Ok(ScoreComponents {
            ml_score,
            rule_score,
            combined_score,
            acceptance_probability: (ml_score * 100.0).clamp(0.0, 100.0),
            cost_fit: cost_fit(candidate.tuition_fee, profile.budget),
        })
    }
}
