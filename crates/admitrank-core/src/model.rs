//! Core data model types for admitrank.
//!
//! Profiles and candidate records are normalized by the loader before
//! they reach the scorers; every type here is plain data that serializes
//! cleanly for whatever presentation layer sits on top.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ensure_finite, ensure_non_negative, AdvisorError, AdvisorResult};

/// Upper bound of the GPA scale.
pub const MAX_GPA: f64 = 4.0;
/// Upper bound of the IELTS band scale.
pub const MAX_IELTS: f64 = 9.0;

/// Case-insensitive country comparison, ignoring surrounding whitespace.
///
/// Uses full Unicode lowercasing so names such as "Österreich" compare
/// equal regardless of case.
pub fn same_country(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// The student being advised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Grade point average on a 0-4 scale.
    pub gpa: f64,
    /// IELTS overall band, 0-9.
    pub ielts: f64,
    /// Yearly tuition budget. Zero means "no limit given".
    pub budget: f64,
    /// Preferred study country.
    #[serde(default)]
    pub country: Option<String>,
    /// Intended field of study.
    #[serde(default)]
    pub field: Option<String>,
}

impl StudentProfile {
    /// Check the numeric ranges a collaborator is expected to enforce.
    pub fn validate(&self) -> AdvisorResult<()> {
        ensure_finite("gpa", self.gpa)?;
        ensure_finite("ielts", self.ielts)?;
        if !(0.0..=MAX_GPA).contains(&self.gpa) {
            return Err(AdvisorError::invalid(format!(
                "gpa must be between 0 and {MAX_GPA}, got {}",
                self.gpa
            )));
        }
        if !(0.0..=MAX_IELTS).contains(&self.ielts) {
            return Err(AdvisorError::invalid(format!(
                "ielts must be between 0 and {MAX_IELTS}, got {}",
                self.ielts
            )));
        }
        ensure_non_negative("budget", self.budget)
    }

    /// The field of study, if one was given and is not blank.
    pub fn field_of_study(&self) -> Option<&str> {
        self.field
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// The preferred country, if one was given and is not blank.
    pub fn preferred_country(&self) -> Option<&str> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// True when the budget should be read as unbounded.
    pub fn budget_unbounded(&self) -> bool {
        self.budget == 0.0
    }
}

/// An institution or program being considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Stable identifier, also the ranking tie-breaker.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Country the institution is located in.
    pub country: String,
    /// World ranking; lower is better.
    pub ranking: u32,
    /// Yearly tuition fee.
    pub tuition_fee: f64,
    /// Programs offered, in catalog order.
    #[serde(default)]
    pub programs: Vec<String>,
    /// Whether scholarships are offered to international students.
    #[serde(default)]
    pub scholarship_available: bool,
}

impl CandidateRecord {
    pub fn validate(&self) -> AdvisorResult<()> {
        if self.id.trim().is_empty() {
            return Err(AdvisorError::invalid("candidate id cannot be empty"));
        }
        if self.ranking == 0 {
            return Err(AdvisorError::invalid(format!(
                "ranking of '{}' must be a positive integer",
                self.id
            )));
        }
        ensure_non_negative("tuition_fee", self.tuition_fee)
    }

    /// Fraction of programs whose name contains `field`, case-insensitively.
    ///
    /// Returns `None` when the candidate lists no programs.
    pub fn program_match(&self, field: &str) -> Option<f64> {
        if self.programs.is_empty() {
            return None;
        }
        let needle = field.to_lowercase();
        let matches = self
            .programs
            .iter()
            .filter(|p| p.to_lowercase().contains(&needle))
            .count();
        Some((matches as f64 / self.programs.len() as f64).min(1.0))
    }
}

/// A named collection of candidates, usually loaded from one TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub candidates: Vec<CandidateRecord>,
}

impl Catalog {
    pub fn get(&self, candidate_id: &str) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }
}

/// Where the ML component of a score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    /// Supplied by an external signal provider.
    External,
    /// Computed by the built-in GPA/IELTS heuristic.
    Fallback,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSource::External => write!(f, "external"),
            SignalSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Score components for one (candidate, profile) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Admission-likelihood signal, 0-1.
    pub ml_score: f64,
    /// Deterministic rule-based fit, 0-1.
    pub rule_score: f64,
    /// Convex fusion of the two scores, 0-1.
    pub combined_score: f64,
    /// `ml_score` as a percentage, 0-100.
    pub acceptance_probability: f64,
    /// How comfortably tuition fits the budget, 0-1.
    pub cost_fit: f64,
}

/// A candidate together with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate_id: String,
    pub name: String,
    pub components: ScoreComponents,
    pub signal_source: SignalSource,
}

/// Direction in which a feature pushes the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contribution {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Positive => write!(f, "positive"),
            Contribution::Negative => write!(f, "negative"),
            Contribution::Neutral => write!(f, "neutral"),
        }
    }
}

/// Key used to order scored candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CombinedScore,
    AcceptanceProbability,
    CostFit,
}

impl SortKey {
    /// Read the sort value out of a score.
    pub fn value(&self, components: &ScoreComponents) -> f64 {
        match self {
            SortKey::CombinedScore => components.combined_score,
            SortKey::AcceptanceProbability => components.acceptance_probability,
            SortKey::CostFit => components.cost_fit,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::CombinedScore => write!(f, "combined_score"),
            SortKey::AcceptanceProbability => write!(f, "acceptance_probability"),
            SortKey::CostFit => write!(f, "cost_fit"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "combined_score" | "combined" => Ok(SortKey::CombinedScore),
            "acceptance_probability" | "acceptance" => Ok(SortKey::AcceptanceProbability),
            "cost_fit" | "cost" => Ok(SortKey::CostFit),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> StudentProfile {
        StudentProfile {
            gpa: 3.4,
            ielts: 7.0,
            budget: 20_000.0,
            country: Some("  Germany ".into()),
            field: Some("".into()),
        }
    }

    fn candidate(programs: &[&str]) -> CandidateRecord {
        CandidateRecord {
            id: "tum".into(),
            name: "Technical University of Munich".into(),
            country: "Germany".into(),
            ranking: 37,
            tuition_fee: 0.0,
            programs: programs.iter().map(|p| p.to_string()).collect(),
            scholarship_available: false,
        }
    }

    #[test]
    fn profile_validation_ranges() {
        assert!(profile().validate().is_ok());

        let mut p = profile();
        p.gpa = 4.5;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.ielts = -0.5;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.budget = -1.0;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.gpa = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn blank_optional_strings_are_absent() {
        let p = profile();
        assert_eq!(p.field_of_study(), None);
        assert_eq!(p.preferred_country(), Some("Germany"));
    }

    #[test]
    fn country_comparison_is_unicode_case_insensitive() {
        assert!(same_country("Österreich", "österreich"));
        assert!(same_country(" ÖSTERREICH", "Österreich "));
        assert!(same_country("germany", "GERMANY"));
        assert!(!same_country("Österreich", "Osterreich"));
    }

    #[test]
    fn candidate_validation() {
        assert!(candidate(&[]).validate().is_ok());

        let mut c = candidate(&[]);
        c.ranking = 0;
        assert!(c.validate().is_err());

        let mut c = candidate(&[]);
        c.tuition_fee = -10.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn program_match_fraction() {
        let c = candidate(&["Computer Science", "Physics", "Applied computer science", "Art"]);
        assert_eq!(c.program_match("computer science"), Some(0.5));
        assert_eq!(candidate(&[]).program_match("physics"), None);
    }

    #[test]
    fn sort_key_display_and_parse() {
        assert_eq!(SortKey::CostFit.to_string(), "cost_fit");
        assert_eq!(
            "acceptance-probability".parse::<SortKey>().unwrap(),
            SortKey::AcceptanceProbability
        );
        assert_eq!("combined".parse::<SortKey>().unwrap(), SortKey::CombinedScore);
        assert!("tuition".parse::<SortKey>().is_err());
    }

    #[test]
    fn score_components_serde_roundtrip() {
        let scored = ScoredCandidate {
            candidate_id: "tum".into(),
            name: "TUM".into(),
            components: ScoreComponents {
                ml_score: 0.8,
                rule_score: 0.9,
                combined_score: 0.84,
                acceptance_probability: 80.0,
                cost_fit: 1.0,
            },
            signal_source: SignalSource::Fallback,
        };
        let json = serde_json::to_string(&scored).unwrap();
        assert!(json.contains("\"signal_source\":\"fallback\""));
        let back: ScoredCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scored);
    }
}
