//! API module for CardioCare
//!
//! This module contains all API-related functionality.

use std::sync::Arc;
use std::time::Duration;

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::configure;

use crate::auth::TokenKeys;
use crate::config::Config;
use crate::db::Database;
use crate::prediction::{HttpRiskPredictor, RiskPredictor};

/// Application state shared by every worker
pub struct AppState {
    pub db: Database,
    pub tokens: TokenKeys,
    pub predictor: Arc<dyn RiskPredictor>,
}

impl AppState {
    pub fn new(db: Database, tokens: TokenKeys, predictor: Arc<dyn RiskPredictor>) -> Self {
        Self {
            db,
            tokens,
            predictor,
        }
    }

    pub fn from_config(config: &Config, db: Database) -> Result<Self, reqwest::Error> {
        let tokens = TokenKeys::new(
            &config.auth.jwt_secret,
            chrono::Duration::hours(config.auth.token_ttl_hours),
        );
        let predictor = HttpRiskPredictor::new(
            config.prediction.url.clone(),
            Duration::from_secs(config.prediction.timeout_secs),
        )?;
        Ok(Self::new(db, tokens, Arc::new(predictor)))
    }
}
