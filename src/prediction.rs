//! Client for the external heart-failure risk-prediction service.
//!
//! The model itself is a black box: it receives the eleven clinical inputs
//! and answers with a classification, a probability, a risk level and
//! recommendation lists. There is no retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::ApiError;
use crate::models::{ClinicalInputs, Recommendations, RiskLevel};

const PREDICTION_FAILED: &str = "Failed to predict patient data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub prediction: i64,
    pub probability: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub recommendations: Recommendations,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RiskPredictor: Send + Sync {
    async fn assess(&self, inputs: &ClinicalInputs) -> Result<Assessment, ApiError>;
}

pub struct HttpRiskPredictor {
    client: Client,
    url: String,
}

impl HttpRiskPredictor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RiskPredictor for HttpRiskPredictor {
    #[instrument(skip(self, inputs), fields(url = %self.url))]
    async fn assess(&self, inputs: &ClinicalInputs) -> Result<Assessment, ApiError> {
        let response = self
            .client
            .post(&self.url)
            .json(inputs)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "prediction service unreachable");
                ApiError::Upstream(PREDICTION_FAILED.into())
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "prediction service rejected request");
            return Err(ApiError::Upstream(PREDICTION_FAILED.into()));
        }

        response.json::<Assessment>().await.map_err(|err| {
            warn!(error = %err, "prediction service returned an unexpected body");
            ApiError::Upstream(PREDICTION_FAILED.into())
        })
    }
}
