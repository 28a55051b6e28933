//! Client for the external prediction service.
//!
//! The service scores batches of trip features and accepts realized trip
//! durations ("actuals") after the fact. Predictions are correlated to
//! their input rows by an echoed passthrough trip id, never by position:
//! the service does not guarantee row order, or that every row comes back.

use std::{env, error, fmt};

use async_trait::async_trait;
use model::TripFeatures;
use uuid::Uuid;

pub mod client;
pub mod payload;

pub use client::ScoringClient;
pub use payload::{Actual, Prediction};

#[derive(Debug)]
pub enum ScoringError {
    Request(reqwest::Error),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        response: Option<String>,
    },
}

impl error::Error for ScoringError {}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScoringError::Request(why) => {
                write!(f, "scoring request error: {}", why)
            }
            ScoringError::InvalidResponse {
                status_code,
                response,
            } => match response {
                Some(text) => write!(
                    f,
                    "scoring service returned {}: {}",
                    status_code, text
                ),
                None => write!(f, "scoring service returned {}", status_code),
            },
        }
    }
}

impl From<reqwest::Error> for ScoringError {
    fn from(why: reqwest::Error) -> Self {
        Self::Request(why)
    }
}

/// Credentials and addressing for the scoring service. All values are
/// required; a partially configured client must not start (the caller
/// treats `None` as fatal).
#[derive(Debug, Clone)]
pub struct ScoringCredentials {
    pub api_url: String,
    pub api_token: String,
    pub deployment_id: String,
    pub server_key: String,
}

impl ScoringCredentials {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_url: env::var("SCORING_API_URL").ok()?,
            api_token: env::var("SCORING_API_TOKEN").ok()?,
            deployment_id: env::var("SCORING_DEPLOYMENT_ID").ok()?,
            server_key: env::var("SCORING_SERVER_KEY").ok()?,
        })
    }
}

/// The outbound surface of the scoring service, abstracted so the pipeline
/// can run against a fake in tests.
#[async_trait]
pub trait ScoringApi {
    /// Scores a batch of trips. The returned predictions may cover any
    /// subset of the submitted rows, in any order.
    async fn predict(
        &self,
        rows: &[TripFeatures],
    ) -> Result<Vec<Prediction>, ScoringError>;

    /// Reports realized durations. Success is any 2xx response; on error
    /// the caller retries the same trips later.
    async fn submit_actuals(&self, actuals: &[Actual]) -> Result<(), ScoringError>;
}

/// Builds the actuals payload for a set of concluded trips.
pub fn actuals_for(trips: &[(Uuid, f64)]) -> Vec<Actual> {
    trips
        .iter()
        .map(|(trip_id, duration)| Actual {
            association_id: *trip_id,
            actual_value: *duration,
        })
        .collect()
}
