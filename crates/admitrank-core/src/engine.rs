//! Advisor engine orchestrator.
//!
//! Scores a catalog against one profile with bounded concurrency, then
//! filters, ranks and optionally explains the result.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::AdvisorResult;
use crate::explain::{Explainer, Explanation};
use crate::model::{CandidateRecord, ScoredCandidate, SignalSource, SortKey, StudentProfile};
use crate::ranking::{CandidateFilter, Ranker};
use crate::scoring::HybridScorer;
use crate::traits::SignalProvider;

/// Configuration for the advisor engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent signal requests.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// What to return from [`AdvisorEngine::recommend`].
#[derive(Debug, Clone, Default)]
pub struct RecommendRequest {
    pub sort_key: SortKey,
    /// `None` keeps every candidate that passes the filter.
    pub top_k: Option<usize>,
    pub filter: CandidateFilter,
    /// Attach an explanation to each ranked entry.
    pub explain: bool,
}

/// One position in a recommendation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position.
    pub rank: usize,
    pub candidate: ScoredCandidate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

/// The ranked outcome of a recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub sort_key: SortKey,
    pub top_k: Option<usize>,
    /// Candidates scored.
    pub considered: usize,
    /// Candidates removed by the filter.
    pub filtered_out: usize,
    pub entries: Vec<RankedEntry>,
}

impl Recommendation {
    /// Combined scores of the entries as percentages.
    pub fn match_percentages(&self) -> Vec<f64> {
        self.entries
            .iter()
            .map(|e| e.candidate.components.combined_score * 100.0)
            .collect()
    }

    /// Entry identifiers in rank order.
    pub fn candidate_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.candidate.candidate_id.as_str())
            .collect()
    }
}

/// The central advisor engine.
pub struct AdvisorEngine {
    signal: Option<Arc<dyn SignalProvider>>,
    scorer: HybridScorer,
    explainer: Explainer,
    ranker: Ranker,
    config: EngineConfig,
}

impl Default for AdvisorEngine {
    fn default() -> Self {
        Self::new(HybridScorer::default(), Explainer::default(), EngineConfig::default())
    }
}

impl AdvisorEngine {
    pub fn new(scorer: HybridScorer, explainer: Explainer, config: EngineConfig) -> Self {
        Self {
            signal: None,
            scorer,
            explainer,
            ranker: Ranker,
            config,
        }
    }

    /// Use `signal` for the admission-likelihood component.
    pub fn with_signal(mut self, signal: Arc<dyn SignalProvider>) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Name of the configured signal provider, if any.
    pub fn signal_name(&self) -> Option<&str> {
        self.signal.as_deref().map(|s| s.name())
    }

    /// Score every candidate against `profile`.
    ///
    /// Results come back in input order. A failing provider is logged and
    /// the candidate is scored with the fallback heuristic; a provider value
    /// outside `[0, 1]` is an error.
    pub async fn score_batch(
        &self,
        profile: &StudentProfile,
        candidates: &[CandidateRecord],
    ) -> AdvisorResult<Vec<ScoredCandidate>> {
        profile.validate()?;

        let start = Instant::now();
        let semaphore = Semaphore::new(self.config.parallelism.max(1));
        let mut futures = FuturesUnordered::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let semaphore = &semaphore;
            futures.push(async move {
                // never closed, so acquire cannot fail
                let _permit = semaphore.acquire().await.ok();
                (index, self.score_one(candidate, profile).await)
            });
        }

        let mut scored = Vec::with_capacity(candidates.len());
        while let Some(item) = futures.next().await {
            scored.push(item);
        }
        scored.sort_by_key(|(index, _)| *index);

        let results = scored
            .into_iter()
            .map(|(_, result)| result)
            .collect::<AdvisorResult<Vec<_>>>()?;

        tracing::debug!(
            candidates = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scored batch"
        );
        Ok(results)
    }

    async fn score_one(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> AdvisorResult<ScoredCandidate> {
        let (signal, signal_source) = match &self.signal {
            Some(provider) => match provider.estimate(candidate, profile).await {
                Ok(value) => (Some(value), SignalSource::External),
                Err(e) => {
                    tracing::warn!(
                        candidate = %candidate.id,
                        provider = provider.name(),
                        "signal failed, using fallback: {e:#}"
                    );
                    (None, SignalSource::Fallback)
                }
            },
            None => (None, SignalSource::Fallback),
        };

        let components = self.scorer.score_candidate(candidate, profile, signal)?;
        tracing::debug!(
            candidate = %candidate.id,
            source = %signal_source,
            combined = components.combined_score,
            "scored"
        );
        Ok(ScoredCandidate {
            candidate_id: candidate.id.clone(),
            name: candidate.name.clone(),
            components,
            signal_source,
        })
    }

    /// Score, filter, rank and optionally explain a catalog.
    pub async fn recommend(
        &self,
        profile: &StudentProfile,
        candidates: &[CandidateRecord],
        request: &RecommendRequest,
    ) -> AdvisorResult<Recommendation> {
        let scored = self.score_batch(profile, candidates).await?;
        let considered = scored.len();

        let kept: Vec<(ScoredCandidate, &CandidateRecord)> = scored
            .into_iter()
            .zip(candidates)
            .filter(|(s, c)| request.filter.matches(c, &s.components))
            .collect();
        let filtered_out = considered - kept.len();

        let ranked = self
            .ranker
            .rank_by(kept, request.sort_key, request.top_k, |(s, _)| s);

        let entries = ranked
            .into_iter()
            .enumerate()
            .map(|(i, (candidate, record))| {
                let explanation = if request.explain {
                    Some(self.explainer.explain(&candidate.components, record, profile)?)
                } else {
                    None
                };
                Ok(RankedEntry {
                    rank: i + 1,
                    candidate,
                    explanation,
                })
            })
            .collect::<AdvisorResult<Vec<_>>>()?;

        tracing::info!(
            considered,
            filtered_out,
            returned = entries.len(),
            sort_key = %request.sort_key,
            "recommendation ready"
        );

        Ok(Recommendation {
            sort_key: request.sort_key,
            top_k: request.top_k,
            considered,
            filtered_out,
            entries,
        })
    }

    /// Score and explain a single candidate.
    pub async fn explain_candidate(
        &self,
        profile: &StudentProfile,
        candidate: &CandidateRecord,
    ) -> AdvisorResult<(ScoredCandidate, Explanation)> {
        profile.validate()?;
        let scored = self.score_one(candidate, profile).await?;
        let explanation = self.explainer.explain(&scored.components, candidate, profile)?;
        Ok((scored, explanation))
    }
}
