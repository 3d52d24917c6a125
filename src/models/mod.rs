//! Domain models for CardioCare
//!
//! [`account`] holds login identities and their roles, [`patient`] holds the
//! cardiac patient records doctors create and nurses monitor.

pub mod account;
pub mod patient;

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use thiserror::Error;

pub use account::{Account, AccountStatus, NewAccount, Role};
pub use patient::{
    ChestPain, ClinicalInputs, ExerciseAngina, PatientPayload, PatientRecord, PatientStatus,
    Recommendations, RestingEcg, RiskLevel, Sex, StSlope,
};

/// A string that did not name any variant of a closed enum.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Current time at the millisecond precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid timestamp: {}", millis).into()))
}
