//! Remote admission model reached over HTTP.
//!
//! The service receives `POST {base_url}/v1/estimate` with the candidate
//! and profile as JSON and answers `{"probability": <0..1>}`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use admitrank_core::model::{CandidateRecord, StudentProfile};
use admitrank_core::traits::SignalProvider;

use crate::error::SignalError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Admission-likelihood estimates from a remote model.
pub struct HttpSignalProvider {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSignalProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        if base_url.trim().is_empty() {
            anyhow::bail!("signal base_url cannot be empty");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct EstimateRequest<'a> {
    candidate: &'a CandidateRecord,
    profile: &'a StudentProfile,
}

#[derive(Deserialize)]
struct EstimateResponse {
    probability: f64,
}

#[async_trait]
impl SignalProvider for HttpSignalProvider {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, candidate, profile), fields(candidate_id = %candidate.id))]
    async fn estimate(
        &self,
        candidate: &CandidateRecord,
        profile: &StudentProfile,
    ) -> anyhow::Result<f64> {
        let mut req = self
            .client
            .post(format!("{}/v1/estimate", self.base_url))
            .json(&EstimateRequest { candidate, profile });
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                SignalError::Timeout(self.timeout_secs)
            } else {
                SignalError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SignalError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let parsed: EstimateResponse = response
            .json()
            .await
            .map_err(|e| SignalError::InvalidResponse(e.to_string()))?;

        tracing::debug!(probability = parsed.probability, "signal received");
        Ok(parsed.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate() -> CandidateRecord {
        CandidateRecord {
            id: "tum".into(),
            name: "Technical University of Munich".into(),
            country: "Germany".into(),
            ranking: 37,
            tuition_fee: 0.0,
            programs: vec!["Informatics".into()],
            scholarship_available: false,
        }
    }

    fn profile() -> StudentProfile {
        StudentProfile {
            gpa: 3.7,
            ielts: 7.5,
            budget: 10_000.0,
            country: None,
            field: Some("Informatics".into()),
        }
    }

    #[tokio::test]
    async fn successful_estimate() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/estimate"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "candidate": {"id": "tum"},
                "profile": {"gpa": 3.7}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"probability": 0.82})),
            )
            .mount(&server)
            .await;

        let provider =
            HttpSignalProvider::new(&server.uri(), Some("test-key".into()), 5).unwrap();
        let value = provider.estimate(&candidate(), &profile()).await.unwrap();
        assert_eq!(value, 0.82);
    }

    #[tokio::test]
    async fn api_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/estimate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model warming up"))
            .mount(&server)
            .await;

        let provider = HttpSignalProvider::new(&server.uri(), None, 5).unwrap();
        let err = provider.estimate(&candidate(), &profile()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("model warming up"));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/estimate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"p": 1})))
            .mount(&server)
            .await;

        let provider = HttpSignalProvider::new(&format!("{}/", server.uri()), None, 5).unwrap();
        let err = provider.estimate(&candidate(), &profile()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SignalError>(),
            Some(SignalError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(HttpSignalProvider::new("  ", None, 5).is_err());
    }
}
