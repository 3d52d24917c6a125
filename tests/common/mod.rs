#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use serde_json::{json, Value};

use cardiocare::auth::password::hash_password;
use cardiocare::auth::TokenKeys;
use cardiocare::db::{accounts, Database};
use cardiocare::models::{Account, NewAccount, Role};
use cardiocare::prediction::HttpRiskPredictor;
use cardiocare::AppState;

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "secret123";

/// Fresh in-memory store; the prediction client points at nothing.
pub async fn state() -> web::Data<AppState> {
    let db = Database::in_memory().await.expect("in-memory database");
    let tokens = TokenKeys::new(SECRET, chrono::Duration::hours(1));
    let predictor = HttpRiskPredictor::new("http://127.0.0.1:9/api/assess", Duration::from_secs(1))
        .expect("prediction client");
    web::Data::new(AppState::new(db, tokens, Arc::new(predictor)))
}

/// Initialized test service over the full route table.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(cardiocare::api::configure),
        )
        .await
    };
}

pub async fn seed(state: &AppState, username: &str, email: &str, role: Role) -> Account {
    accounts::insert(
        state.db.pool(),
        &NewAccount {
            username: username.into(),
            email: email.into(),
            password_hash: hash_password(PASSWORD).expect("hash"),
            role,
        },
    )
    .await
    .expect("seed account")
}

pub fn token(state: &AppState, account: &Account) -> String {
    state.tokens.issue(account).expect("token")
}

/// A complete create-patient body.
pub fn patient_body(email: &str, phone: &str, doctor_id: &str, nurse_email: &str) -> Value {
    json!({
        "email": email,
        "phone_number": phone,
        "Username": "Pat",
        "doctor": doctor_id,
        "assignedNurseEmail": nurse_email,
        "status": "New",
        "age": 54,
        "sex": "M",
        "chest_pain": "ASY",
        "resting_bp": 140,
        "cholesterol": 239,
        "fasting_bs": 0,
        "resting_ecg": "Normal",
        "max_hr": 160,
        "exercise_angina": "N",
        "oldpeak": 1.2,
        "st_slope": "Flat",
        "prediction": 1,
        "probability": 0.81,
        "risk_level": "High Risk",
        "lifestyle": ["Reduce sodium intake"],
        "urgent_actions": ["Cardiology consult"]
    })
}
