//! Scripted signal provider for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use admitrank_core::model::{CandidateRecord, StudentProfile};
use admitrank_core::traits::SignalProvider;

use crate::error::SignalError;

/// Returns configured values per candidate without any network access.
pub struct MockSignal {
    /// Candidate ID → value.
    values: HashMap<String, f64>,
    /// Value for candidates not in `values`.
    default_value: f64,
    /// Candidate IDs whose lookups fail.
    failing: Vec<String>,
    call_count: AtomicU32,
}

impl MockSignal {
    pub fn new(values: HashMap<String, f64>, default_value: f64) -> Self {
        Self {
            values,
            default_value,
            failing: Vec::new(),
            call_count: AtomicU32::new(0),
        }
    }

    /// A signal that always answers `value`.
    pub fn with_fixed_value(value: f64) -> Self {
        Self::new(HashMap::new(), value)
    }

    /// Make lookups for `candidate_id` fail with a network error.
    pub fn failing_for(mut self, candidate_id: &str) -> Self {
        self.failing.push(candidate_id.to_string());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SignalProvider for MockSignal {
    fn name(&self) -> &str {
        "mock"
    }

    async fn estimate(
        &self,
        candidate: &CandidateRecord,
        _profile: &StudentProfile,
    ) -> anyhow::Result<f64> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if self.failing.iter().any(|id| id == &candidate.id) {
            return Err(SignalError::NetworkError(format!("no route to {}", candidate.id)).into());
        }

        Ok(self
            .values
            .get(&candidate.id)
            .copied()
            .unwrap_or(self.default_value))
    }
}
