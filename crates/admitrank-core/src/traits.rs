//! Pluggable admission-likelihood signal.
//!
//! Implementations live in `admitrank-signals`; the engine works without
//! any of them by falling back to the built-in heuristic.

use async_trait::async_trait;

use crate::model::{CandidateRecord, StudentProfile};

/// A source of admission-likelihood estimates in `[0, 1]`.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Human-readable provider name (e.g. "http").
    fn name(&self) -> &str;

    /// Estimate how likely `profile` is to be admitted by `candidate`.
    async fn estimate(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> anyhow::Result<f64>;
}

/// Adapts a plain synchronous function into a [`SignalProvider`].
pub struct FnSignal<F> {
    name: String,
    estimator: F,
}

impl<F> FnSignal<F>
where
    F: Fn(&CandidateRecord, &StudentProfile) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, estimator: F) -> Self {
        Self {
            name: name.into(),
            estimator,
        }
    }
}

#[async_trait]
impl<F> SignalProvider for FnSignal<F>
where
    F: Fn(&CandidateRecord, &StudentProfile) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn estimate(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> anyhow::Result<f64> {
        Ok((self.estimator)(candidate, profile))
    }
}
