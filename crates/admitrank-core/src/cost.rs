//! Total-cost, return-on-investment and affordability analysis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, AdvisorError, AdvisorResult};
use crate::model::{same_country, CandidateRecord};

/// Monthly living cost assumed for countries missing from the table.
pub const DEFAULT_MONTHLY_LIVING_COST: f64 = 1000.0;

pub(crate) fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Monthly living cost per country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingCostTable {
    #[serde(default = "default_monthly_cost")]
    pub default_monthly_cost: f64,
    #[serde(default)]
    pub per_country: BTreeMap<String, f64>,
}

fn default_monthly_cost() -> f64 {
    DEFAULT_MONTHLY_LIVING_COST
}

impl Default for LivingCostTable {
    fn default() -> Self {
        let per_country = [
            ("France", 900.0),
            ("Germany", 800.0),
            ("Netherlands", 1200.0),
            ("Belgium", 1000.0),
            ("Finland", 1100.0),
            ("Italy", 700.0),
            ("Spain", 800.0),
            ("Austria", 950.0),
            ("UK", 1400.0),
            ("USA", 1500.0),
            ("Canada", 1300.0),
            ("Australia", 1400.0),
            ("China", 600.0),
            ("India", 400.0),
            ("Japan", 1100.0),
        ]
        .into_iter()
        .map(|(country, cost)| (country.to_string(), cost))
        .collect();

        Self {
            default_monthly_cost: DEFAULT_MONTHLY_LIVING_COST,
            per_country,
        }
    }
}

impl LivingCostTable {
    /// Case-insensitive lookup of a country's monthly cost.
    pub fn monthly_cost(&self, country: &str) -> Option<f64> {
        self.per_country
            .iter()
            .find(|(name, _)| same_country(name, country))
            .map(|(_, cost)| *cost)
    }

    /// Overlay `overrides` on top of this table.
    pub fn merged(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for (country, cost) in overrides {
            self.per_country.retain(|name, _| !same_country(name, country));
            self.per_country.insert(country.clone(), *cost);
        }
        self
    }

    pub fn validate(&self) -> AdvisorResult<()> {
        ensure_non_negative("default_monthly_cost", self.default_monthly_cost)?;
        for (country, cost) in &self.per_country {
            ensure_non_negative(&format!("living cost for {country}"), *cost)?;
        }
        Ok(())
    }
}

/// Tuition plus living costs over the length of a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub tuition_fee: f64,
    pub country: String,
    pub duration_years: u32,
    pub monthly_living_cost: f64,
    pub yearly_living_cost: f64,
    pub total_cost: f64,
    pub total_cost_per_month: f64,
    /// The country was not in the table and the default was applied.
    pub used_default_living_cost: bool,
}

/// Total cost of studying in `country` for `duration_years`, with tuition
/// charged yearly.
pub fn analyze_total_cost(
    tuition_fee: f64,
    country: &str,
    duration_years: u32,
    table: &LivingCostTable,
) -> AdvisorResult<CostBreakdown> {
    ensure_non_negative("tuition_fee", tuition_fee)?;
    if duration_years == 0 {
        return Err(AdvisorError::invalid("duration_years must be at least 1"));
    }

    let (monthly, used_default) = match table.monthly_cost(country) {
        Some(cost) => (cost, false),
        None => {
            tracing::warn!(
                country,
                default = table.default_monthly_cost,
                "country not in living cost table, using default"
            );
            (table.default_monthly_cost, true)
        }
    };

    let yearly_living = monthly * 12.0;
    let total = (tuition_fee + yearly_living) * f64::from(duration_years);
    let months = f64::from(duration_years) * 12.0;

    Ok(CostBreakdown {
        tuition_fee,
        country: country.trim().to_string(),
        duration_years,
        monthly_living_cost: monthly,
        yearly_living_cost: yearly_living,
        total_cost: round_dp(total, 2),
        total_cost_per_month: round_dp(total / months, 2),
        used_default_living_cost: used_default,
    })
}

/// Expected salary per unit of tuition, rounded to two decimals.
///
/// Free tuition yields zero rather than an infinite ratio.
pub fn return_on_investment(tuition_fee: f64, expected_salary: f64) -> AdvisorResult<f64> {
    ensure_non_negative("tuition_fee", tuition_fee)?;
    ensure_non_negative("expected_salary", expected_salary)?;
    if tuition_fee == 0.0 {
        return Ok(0.0);
    }
    Ok(round_dp(expected_salary / tuition_fee, 2))
}

/// How much of a catalog fits under a tuition budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilitySummary {
    pub max_budget: f64,
    pub total_candidates: usize,
    pub affordable_candidates: usize,
    pub percentage_affordable: f64,
    pub cheapest_candidate: Option<String>,
    pub average_fee_in_budget: f64,
}

pub fn affordability(
    candidates: &[CandidateRecord],
    max_budget: f64,
) -> AdvisorResult<AffordabilitySummary> {
    if !max_budget.is_finite() || max_budget <= 0.0 {
        return Err(AdvisorError::invalid(format!(
            "max_budget must be positive, got {max_budget}"
        )));
    }

    let affordable: Vec<&CandidateRecord> = candidates
        .iter()
        .filter(|c| c.tuition_fee <= max_budget)
        .collect();

    let percentage = if candidates.is_empty() {
        0.0
    } else {
        round_dp(affordable.len() as f64 / candidates.len() as f64 * 100.0, 2)
    };

    let cheapest = affordable
        .iter()
        .min_by(|a, b| a.tuition_fee.total_cmp(&b.tuition_fee))
        .map(|c| c.id.clone());

    let average = if affordable.is_empty() {
        0.0
    } else {
        let sum: f64 = affordable.iter().map(|c| c.tuition_fee).sum();
        round_dp(sum / affordable.len() as f64, 2)
    };

    Ok(AffordabilitySummary {
        max_budget,
        total_candidates: candidates.len(),
        affordable_candidates: affordable.len(),
        percentage_affordable: percentage,
        cheapest_candidate: cheapest,
        average_fee_in_budget: average,
    })
}
