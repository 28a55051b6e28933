use std::time::Duration;

use async_trait::async_trait;
use model::TripFeatures;

use crate::payload::{Actual, Prediction, PredictionResponse, PredictionRow};
use crate::{ScoringApi, ScoringCredentials, ScoringError};

/// Transport-level timeout. Keeps a hung scoring call from blocking its
/// cycle indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ScoringClient {
    credentials: ScoringCredentials,
    http: reqwest::Client,
}

impl ScoringClient {
    pub fn new(credentials: ScoringCredentials) -> Result<Self, ScoringError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { credentials, http })
    }

    fn predictions_url(&self) -> String {
        format!(
            "{}/deployments/{}/predictions",
            self.credentials.api_url, self.credentials.deployment_id
        )
    }

    fn actuals_url(&self) -> String {
        format!(
            "{}/deployments/{}/actuals",
            self.credentials.api_url, self.credentials.deployment_id
        )
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, ScoringError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.credentials.api_token)
            .header("scoring-server-key", &self.credentials.server_key)
            .json(body)
            .send()
            .await?;

        let status_code = response.status();
        if !status_code.is_success() {
            let text = response.text().await.ok();
            return Err(ScoringError::InvalidResponse {
                status_code,
                response: text,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ScoringApi for ScoringClient {
    async fn predict(
        &self,
        rows: &[TripFeatures],
    ) -> Result<Vec<Prediction>, ScoringError> {
        let payload: Vec<PredictionRow> =
            rows.iter().map(PredictionRow::from).collect();
        let response = self.post_json(&self.predictions_url(), &payload).await?;
        let response: PredictionResponse = response.json().await?;
        Ok(response.into_predictions())
    }

    async fn submit_actuals(&self, actuals: &[Actual]) -> Result<(), ScoringError> {
        self.post_json(&self.actuals_url(), &actuals).await?;
        Ok(())
    }
}
