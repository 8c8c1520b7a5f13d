//! Feature attribution and narrative explanations.
//!
//! Attribution is computed first and sorted once; everything narrative is
//! rendered from that sorted slice, so the "top factors" a reader sees are
//! always the three highest-importance attributions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_non_negative, AdvisorError, AdvisorResult};
use crate::model::{CandidateRecord, Contribution, ScoreComponents, StudentProfile};
use crate::scoring::ranking_component;

/// Number of attributions surfaced as contributing factors.
pub const TOP_FACTORS: usize = 3;

const GPA_PIVOT: f64 = 2.5;
const IELTS_PIVOT: f64 = 5.5;
const IELTS_SPAN: f64 = 3.5;
const RANKING_HORIZON: f64 = 500.0;

/// Relative weight of each explained feature. Sums to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub gpa: f64,
    pub ielts: f64,
    pub budget: f64,
    pub ranking: f64,
    pub programs: f64,
    pub scholarships: f64,
}

impl FeatureWeights {
    pub fn sum(&self) -> f64 {
        self.gpa + self.ielts + self.budget + self.ranking + self.programs + self.scholarships
    }

    pub fn validate(&self) -> AdvisorResult<()> {
        for (name, w) in [
            ("gpa", self.gpa),
            ("ielts", self.ielts),
            ("budget", self.budget),
            ("ranking", self.ranking),
            ("programs", self.programs),
            ("scholarships", self.scholarships),
        ] {
            ensure_non_negative(name, w)?;
        }
        if (self.sum() - 1.0).abs() > 1e-9 {
            return Err(AdvisorError::invalid(format!(
                "feature weights must sum to 1.0, got {}",
                self.sum()
            )));
        }
        Ok(())
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            gpa: 0.25,
            ielts: 0.20,
            budget: 0.15,
            ranking: 0.20,
            programs: 0.10,
            scholarships: 0.10,
        }
    }
}

/// How much one feature weighed in the assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature_name: String,
    pub importance_score: f64,
    pub contribution: Contribution,
    pub impact_percentage: f64,
}

impl FeatureAttribution {
    fn new(name: &str, importance: f64, contribution: Contribution) -> Self {
        let importance_score = importance.max(0.0);
        Self {
            feature_name: name.to_string(),
            importance_score,
            contribution,
            impact_percentage: importance_score * 100.0,
        }
    }
}

/// Confidence bucket of a prediction score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(prediction_score: f64) -> Self {
        if prediction_score >= 0.8 {
            Confidence::High
        } else if prediction_score >= 0.6 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Qualitative verdict on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLabel {
    Likely,
    Possible,
    Unlikely,
}

impl MatchLabel {
    pub fn from_score(prediction_score: f64) -> Self {
        if prediction_score >= 0.7 {
            MatchLabel::Likely
        } else if prediction_score >= 0.5 {
            MatchLabel::Possible
        } else {
            MatchLabel::Unlikely
        }
    }
}

impl fmt::Display for MatchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLabel::Likely => write!(f, "likely"),
            MatchLabel::Possible => write!(f, "possible"),
            MatchLabel::Unlikely => write!(f, "unlikely"),
        }
    }
}

/// One of the top attributions, rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub feature_name: String,
    pub contribution: Contribution,
    pub summary: String,
}

/// Human-readable account of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Prediction score as a percentage, one decimal.
    pub score_percent: f64,
    pub label: MatchLabel,
    pub confidence: Confidence,
    /// Attributions, descending by importance.
    pub feature_importance: Vec<FeatureAttribution>,
    /// The top attributions in the same order.
    pub contributing_factors: Vec<ContributingFactor>,
    pub positive_indicators: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Builds explanations from the same normalized inputs the scorers use.
#[derive(Debug, Clone)]
pub struct Explainer {
    weights: FeatureWeights,
    currency: String,
}

impl Default for Explainer {
    fn default() -> Self {
        Self {
            weights: FeatureWeights::default(),
            currency: "€".to_string(),
        }
    }
}

impl Explainer {
    pub fn new(weights: FeatureWeights) -> AdvisorResult<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            ..Default::default()
        })
    }

    /// Use a different currency symbol in rendered amounts.
    pub fn with_currency(mut self, symbol: impl Into<String>) -> Self {
        self.currency = symbol.into();
        self
    }

    /// Explain `score` for `candidate` against `profile`.
    ///
    /// The combined score is the prediction score being explained.
    pub fn explain(
        &self,
        score: &ScoreComponents,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> AdvisorResult<Explanation> {
        let prediction_score = score.combined_score;
        ensure_finite("prediction score", prediction_score)?;

        let feature_importance = self.attributions(candidate, profile)?;
        let contributing_factors = render_contributing_factors(&feature_importance);

        Ok(Explanation {
            score_percent: round1(prediction_score * 100.0).clamp(0.0, 100.0),
            label: MatchLabel::from_score(prediction_score),
            confidence: Confidence::from_score(prediction_score),
            feature_importance,
            contributing_factors,
            positive_indicators: self.positive_indicators(candidate, profile),
            concerns: self.concerns(candidate, profile),
            recommendations: self.recommendations(candidate, profile, prediction_score),
        })
    }

    /// Per-feature attributions sorted descending by importance.
    ///
    /// Equal importances keep declaration order.
    pub fn attributions(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> AdvisorResult<Vec<FeatureAttribution>> {
        ensure_finite("gpa", profile.gpa)?;
        ensure_finite("ielts", profile.ielts)?;
        ensure_non_negative("budget", profile.budget)?;
        ensure_non_negative("tuition_fee", candidate.tuition_fee)?;
        let w = &self.weights;

        let gpa = profile.gpa;
        let gpa_contribution = if gpa >= 3.0 {
            Contribution::Positive
        } else if gpa < 2.0 {
            Contribution::Negative
        } else {
            Contribution::Neutral
        };

        let ielts = profile.ielts;
        let ielts_contribution = if ielts >= 6.5 {
            Contribution::Positive
        } else if ielts < 5.0 {
            Contribution::Negative
        } else {
            Contribution::Neutral
        };

        let tuition = candidate.tuition_fee;
        let (budget_distance, budget_contribution) = if profile.budget_unbounded() {
            (0.0, Contribution::Neutral)
        } else {
            let closeness = 1.0 - ((profile.budget - tuition).abs() / profile.budget).min(1.0);
            let contribution = if tuition <= profile.budget {
                Contribution::Positive
            } else {
                Contribution::Negative
            };
            (closeness, contribution)
        };

        let ranking_contribution = match candidate.ranking {
            0..=100 => Contribution::Positive,
            101..=300 => Contribution::Neutral,
            _ => Contribution::Negative,
        };

        let program_match = profile
            .field_of_study()
            .and_then(|field| candidate.program_match(field))
            .unwrap_or(0.0);
        let program_contribution = if program_match > 0.5 {
            Contribution::Positive
        } else {
            Contribution::Neutral
        };

        let (scholarship_distance, scholarship_contribution) = if candidate.scholarship_available {
            (1.0, Contribution::Positive)
        } else {
            (0.0, Contribution::Neutral)
        };

        let mut attributions = vec![
            FeatureAttribution::new(
                "GPA",
                ((gpa - GPA_PIVOT).abs() / GPA_PIVOT).min(1.0) * w.gpa,
                gpa_contribution,
            ),
            FeatureAttribution::new(
                "IELTS",
                ((ielts - IELTS_PIVOT).abs() / IELTS_SPAN).min(1.0) * w.ielts,
                ielts_contribution,
            ),
            FeatureAttribution::new("Budget Fit", budget_distance * w.budget, budget_contribution),
            FeatureAttribution::new(
                "Ranking",
                ranking_component(candidate.ranking, RANKING_HORIZON) * w.ranking,
                ranking_contribution,
            ),
            FeatureAttribution::new(
                "Program Alignment",
                program_match * w.programs,
                program_contribution,
            ),
            FeatureAttribution::new(
                "Scholarship Availability",
                scholarship_distance * w.scholarships,
                scholarship_contribution,
            ),
        ];

        attributions.sort_by(|a, b| b.importance_score.total_cmp(&a.importance_score));
        Ok(attributions)
    }

    fn positive_indicators(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> Vec<String> {
        let mut indicators = Vec::new();

        if profile.gpa >= 3.5 {
            indicators.push("Strong academic profile (GPA >= 3.5)".to_string());
        }
        if profile.ielts >= 7.0 {
            indicators.push("Strong English proficiency (IELTS >= 7.0)".to_string());
        }
        if !profile.budget_unbounded() && candidate.tuition_fee <= profile.budget {
            indicators.push(format!(
                "Tuition within budget ({}{})",
                self.currency,
                format_amount(candidate.tuition_fee)
            ));
        }
        if candidate.scholarship_available {
            indicators.push("Scholarships available for international students".to_string());
        }
        if candidate.ranking <= 100 {
            indicators.push(format!("Highly ranked institution (#{})", candidate.ranking));
        }

        indicators
    }

    fn concerns(&self, candidate: &CandidateRecord, profile: &StudentProfile) -> Vec<String> {
        let mut concerns = Vec::new();

        if profile.gpa < 2.5 {
            concerns.push("Lower GPA may affect admission chances".to_string());
        }
        if profile.ielts < 6.0 {
            concerns.push("IELTS score below typical admission requirement".to_string());
        }
        if !profile.budget_unbounded() && candidate.tuition_fee > profile.budget {
            concerns.push(format!(
                "Tuition ({}{}) exceeds budget",
                self.currency,
                format_amount(candidate.tuition_fee)
            ));
        }
        if candidate.ranking > 400 {
            concerns.push(format!("Lower ranked institution (#{})", candidate.ranking));
        }

        concerns
    }

    fn recommendations(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
        prediction_score: f64,
    ) -> Vec<String> {
        let mut recommendations: Vec<String> = match MatchLabel::from_score(prediction_score) {
            MatchLabel::Unlikely => vec![
                "Consider strengthening your academic profile for this institution".into(),
                "Explore similar universities with lower admission barriers".into(),
            ],
            MatchLabel::Possible => vec![
                "Strong application recommended. Prepare a compelling essay".into(),
                "Highlight relevant work experience and achievements".into(),
            ],
            MatchLabel::Likely => vec![
                "Good fit. This university aligns well with your profile".into(),
                "Begin preparing application materials early".into(),
            ],
        };

        if !profile.budget_unbounded() && candidate.tuition_fee > profile.budget * 1.2 {
            recommendations.push("Explore scholarship opportunities to bridge the cost gap".into());
        }

        recommendations
    }
}

/// Render the top attributions of an already-sorted slice.
pub fn render_contributing_factors(sorted: &[FeatureAttribution]) -> Vec<ContributingFactor> {
    sorted
        .iter()
        .take(TOP_FACTORS)
        .map(|fa| {
            let (marker, verdict) = match fa.contribution {
                Contribution::Positive => ("✓", "is favorable"),
                Contribution::Negative => ("✗", "is challenging"),
                Contribution::Neutral => ("~", "is average"),
            };
            ContributingFactor {
                feature_name: fa.feature_name.clone(),
                contribution: fa.contribution,
                summary: format!(
                    "{marker} {} {verdict} ({:.0}% impact)",
                    fa.feature_name, fa.impact_percentage
                ),
            }
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Whole-unit amount with thousands separators, e.g. `25,000`.
pub fn format_amount(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if whole < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::HybridScorer;

    fn profile(gpa: f64, ielts: f64, budget: f64, field: Option<&str>) -> StudentProfile {
        StudentProfile {
            gpa,
            ielts,
            budget,
            country: None,
            field: field.map(String::from),
        }
    }

    fn candidate(
        ranking: u32,
        tuition: f64,
        programs: &[&str],
        scholarship: bool,
    ) -> CandidateRecord {
        CandidateRecord {
            id: "kth".into(),
            name: "KTH Royal Institute of Technology".into(),
            country: "Sweden".into(),
            ranking,
            tuition_fee: tuition,
            programs: programs.iter().map(|p| p.to_string()).collect(),
            scholarship_available: scholarship,
        }
    }

    fn explain(c: &CandidateRecord, p: &StudentProfile) -> Explanation {
        let score = HybridScorer::default().score_candidate(c, p, None).unwrap();
        Explainer::default().explain(&score, c, p).unwrap()
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((FeatureWeights::default().sum() - 1.0).abs() < 1e-12);
        assert!(FeatureWeights::default().validate().is_ok());
        let skewed = FeatureWeights {
            gpa: 0.5,
            ..Default::default()
        };
        assert!(Explainer::new(skewed).is_err());
    }

    #[test]
    fn attributions_are_sorted_descending() {
        let c = candidate(50, 25_000.0, &["Computer Science"], true);
        let p = profile(3.8, 7.5, 30_000.0, Some("Computer Science"));
        let attrs = Explainer::default().attributions(&c, &p).unwrap();
        assert_eq!(attrs.len(), 6);
        for pair in attrs.windows(2) {
            assert!(pair[0].importance_score >= pair[1].importance_score);
        }
        for a in &attrs {
            assert!((a.impact_percentage - a.importance_score * 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn gpa_attribution_values() {
        let c = candidate(600, 0.0, &[], false);
        let p = profile(3.75, 5.5, 0.0, None);
        let attrs = Explainer::default().attributions(&c, &p).unwrap();
        // GPA: |3.75 - 2.5| / 2.5 = 0.5, times 0.25
        let gpa = attrs.iter().find(|a| a.feature_name == "GPA").unwrap();
        assert!((gpa.importance_score - 0.125).abs() < 1e-12);
        assert_eq!(gpa.contribution, Contribution::Positive);
        // GPA is the only non-zero attribution, so it leads
        assert_eq!(attrs[0].feature_name, "GPA");
    }

    #[test]
    fn contribution_thresholds() {
        let c = candidate(250, 40_000.0, &["History", "Art"], false);
        let p = profile(1.9, 4.5, 30_000.0, Some("Physics"));
        let attrs = Explainer::default().attributions(&c, &p).unwrap();
        let by_name = |n: &str| attrs.iter().find(|a| a.feature_name == n).unwrap().contribution;

        assert_eq!(by_name("GPA"), Contribution::Negative);
        assert_eq!(by_name("IELTS"), Contribution::Negative);
        assert_eq!(by_name("Budget Fit"), Contribution::Negative);
        assert_eq!(by_name("Ranking"), Contribution::Neutral);
        assert_eq!(by_name("Program Alignment"), Contribution::Neutral);
        assert_eq!(by_name("Scholarship Availability"), Contribution::Neutral);
    }

    #[test]
    fn contributing_factors_follow_attribution_order() {
        let cases = [
            (
                candidate(50, 25_000.0, &["Computer Science"], true),
                profile(3.8, 7.5, 30_000.0, Some("Computer Science")),
            ),
            (
                candidate(450, 60_000.0, &["Law"], false),
                profile(1.5, 4.0, 20_000.0, Some("Medicine")),
            ),
            (
                candidate(180, 9_000.0, &["Biology", "Chemistry"], true),
                profile(2.7, 6.0, 0.0, None),
            ),
        ];
        for (c, p) in &cases {
            let e = explain(c, p);
            assert_eq!(e.contributing_factors.len(), TOP_FACTORS);
            for (factor, attr) in e.contributing_factors.iter().zip(&e.feature_importance) {
                assert_eq!(factor.feature_name, attr.feature_name);
                assert_eq!(factor.contribution, attr.contribution);
                assert!(factor.summary.contains(&attr.feature_name));
            }
        }
    }

    #[test]
    fn rendering_is_independent_of_scoring() {
        let sorted = vec![
            FeatureAttribution::new("Ranking", 0.18, Contribution::Positive),
            FeatureAttribution::new("GPA", 0.1, Contribution::Neutral),
            FeatureAttribution::new("IELTS", 0.05, Contribution::Negative),
            FeatureAttribution::new("Budget Fit", 0.01, Contribution::Positive),
        ];
        let rendered = render_contributing_factors(&sorted);
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0].summary, "✓ Ranking is favorable (18% impact)");
        assert_eq!(rendered[1].summary, "~ GPA is average (10% impact)");
        assert_eq!(rendered[2].summary, "✗ IELTS is challenging (5% impact)");
        assert!(render_contributing_factors(&[]).is_empty());
    }

    #[test]
    fn confidence_and_label_buckets() {
        assert_eq!(Confidence::from_score(0.85), Confidence::High);
        assert_eq!(Confidence::from_score(0.8), Confidence::High);
        assert_eq!(Confidence::from_score(0.6), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.59), Confidence::Low);
        assert_eq!(MatchLabel::from_score(0.7), MatchLabel::Likely);
        assert_eq!(MatchLabel::from_score(0.55), MatchLabel::Possible);
        assert_eq!(MatchLabel::from_score(0.2), MatchLabel::Unlikely);
    }

    #[test]
    fn strong_profile_narrative() {
        let c = candidate(50, 25_000.0, &["Computer Science"], true);
        let p = profile(3.8, 7.5, 30_000.0, Some("Computer Science"));
        let e = explain(&c, &p);

        assert_eq!(e.confidence, Confidence::High);
        assert_eq!(e.label, MatchLabel::Likely);
        assert!(e.score_percent >= 80.0);
        assert!(e.positive_indicators.iter().any(|s| s == "Tuition within budget (€25,000)"));
        assert!(e.positive_indicators.iter().any(|s| s.contains("#50")));
        assert!(e.concerns.is_empty());
        assert!(e.recommendations[0].starts_with("Good fit"));
    }

    #[test]
    fn weak_profile_narrative() {
        let c = candidate(450, 40_000.0, &["Law"], false);
        let p = profile(2.0, 5.0, 20_000.0, None);
        let e = explain(&c, &p);

        assert!(e.positive_indicators.is_empty());
        assert_eq!(e.concerns.len(), 4);
        assert!(e.concerns.contains(&"Tuition (€40,000) exceeds budget".to_string()));
        assert!(e
            .recommendations
            .iter()
            .any(|r| r.contains("scholarship opportunities")));
    }

    #[test]
    fn zero_budget_is_neutral() {
        let c = candidate(120, 12_000.0, &[], false);
        let p = profile(3.0, 6.5, 0.0, None);
        let e = explain(&c, &p);
        let budget = e
            .feature_importance
            .iter()
            .find(|a| a.feature_name == "Budget Fit")
            .unwrap();
        assert_eq!(budget.importance_score, 0.0);
        assert_eq!(budget.contribution, Contribution::Neutral);
        assert!(!e.concerns.iter().any(|c| c.contains("budget")));
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(25_000.0), "25,000");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
        assert_eq!(Explainer::default().with_currency("$").currency, "$");
    }
}
