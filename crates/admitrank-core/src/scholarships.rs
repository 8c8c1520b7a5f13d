//! Scholarship catalog and country matching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, AdvisorError, AdvisorResult};
use crate::model::same_country;

/// How much of the cost a scholarship covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    Full,
    Partial,
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coverage::Full => write!(f, "full"),
            Coverage::Partial => write!(f, "partial"),
        }
    }
}

impl FromStr for Coverage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Coverage::Full),
            "partial" => Ok(Coverage::Partial),
            other => Err(format!("unknown coverage: {other} (expected full or partial)")),
        }
    }
}

/// A scholarship open to international students in one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub name: String,
    pub country: String,
    pub coverage: Coverage,
    /// Yearly award amount.
    pub amount: f64,
    /// Free-text eligibility criteria.
    #[serde(default)]
    pub eligibility: String,
}

impl Scholarship {
    pub fn validate(&self) -> AdvisorResult<()> {
        if self.name.trim().is_empty() {
            return Err(AdvisorError::invalid("scholarship name cannot be empty"));
        }
        if self.country.trim().is_empty() {
            return Err(AdvisorError::invalid(format!(
                "scholarship '{}' has no country",
                self.name
            )));
        }
        ensure_non_negative("amount", self.amount)
    }
}

/// Scholarships available in `country`, optionally narrowed to one coverage
/// type. Catalog order is preserved.
pub fn match_scholarships<'a>(
    scholarships: &'a [Scholarship],
    country: &str,
    coverage: Option<Coverage>,
) -> Vec<&'a Scholarship> {
    scholarships
        .iter()
        .filter(|s| same_country(&s.country, country))
        .filter(|s| match coverage {
            Some(c) => s.coverage == c,
            None => true,
        })
        .collect()
}
