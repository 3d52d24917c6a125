use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::{Account, ClinicalInputs, PatientPayload, PatientRecord};
use crate::services::{invalid_fields, patients};

fn summary(record: &PatientRecord) -> serde_json::Value {
    json!({
        "id": record.id,
        "email": record.email,
        "Username": record.username,
        "status": record.status,
        "prediction": record.prediction,
        "probability": record.probability,
        "risk_level": record.risk_level,
    })
}

pub async fn create_patient(
    state: web::Data<AppState>,
    caller: web::ReqData<Account>,
    body: web::Json<PatientPayload>,
) -> Result<HttpResponse, ApiError> {
    let record = patients::create_patient(&state.db, &caller, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Patient created successfully.",
        "patient": summary(&record),
    })))
}

pub async fn update_patient(
    state: web::Data<AppState>,
    caller: web::ReqData<Account>,
    body: web::Json<PatientPayload>,
) -> Result<HttpResponse, ApiError> {
    let record = patients::update_patient(&state.db, &caller, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patient updated successfully.",
        "patient": summary(&record),
    })))
}

pub async fn delete_patient(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    patients::delete_patient(&state.db, &id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Successfully deleted patient data.",
    })))
}

pub async fn list_patients(
    state: web::Data<AppState>,
    caller: web::ReqData<Account>,
) -> Result<HttpResponse, ApiError> {
    let records = patients::list_for_doctor(&state.db, &caller).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": records,
    })))
}

/// Scores clinical inputs without storing anything; the client attaches the
/// result to a create or update request afterwards.
pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<ClinicalInputs>,
) -> Result<HttpResponse, ApiError> {
    let inputs = body.into_inner();
    inputs.validate().map_err(invalid_fields)?;
    let assessment = state.predictor.assess(&inputs).await?;
    Ok(HttpResponse::Ok().json(assessment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};

    use crate::auth::TokenKeys;
    use crate::db::Database;
    use crate::models::{Recommendations, RiskLevel};
    use crate::prediction::{Assessment, MockRiskPredictor};

    fn clinical_body() -> serde_json::Value {
        json!({
            "age": 54, "sex": "M", "chest_pain": "ASY", "resting_bp": 140,
            "cholesterol": 239, "fasting_bs": 0, "resting_ecg": "Normal", "max_hr": 160,
            "exercise_angina": "N", "oldpeak": 1.2, "st_slope": "Flat"
        })
    }

    async fn state_with(predictor: MockRiskPredictor) -> web::Data<AppState> {
        let db = Database::in_memory().await.unwrap();
        let tokens = TokenKeys::new("predict-test-secret", chrono::Duration::hours(1));
        web::Data::new(AppState::new(db, tokens, Arc::new(predictor)))
    }

    #[actix_web::test]
    async fn predict_returns_the_assessment() {
        let mut predictor = MockRiskPredictor::new();
        predictor
            .expect_assess()
            .withf(|inputs| inputs.age == 54 && inputs.max_hr == 160)
            .times(1)
            .returning(|_| {
                Ok(Assessment {
                    prediction: 1,
                    probability: 0.74,
                    risk_level: RiskLevel::Moderate,
                    recommendations: Recommendations::default(),
                })
            });

        let app = test::init_service(
            App::new()
                .app_data(state_with(predictor).await)
                .route("/predict", web::post().to(predict)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(clinical_body())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["prediction"], 1);
        assert_eq!(body["risk_level"], "Moderate Risk");
    }

    #[actix_web::test]
    async fn predict_rejects_out_of_range_inputs_before_calling_out() {
        let mut predictor = MockRiskPredictor::new();
        predictor.expect_assess().never();

        let app = test::init_service(
            App::new()
                .app_data(state_with(predictor).await)
                .route("/predict", web::post().to(predict)),
        )
        .await;

        let mut body = clinical_body();
        body["fasting_bs"] = json!(3);
        let req = test::TestRequest::post().uri("/predict").set_json(body).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn predict_surfaces_upstream_failure() {
        let mut predictor = MockRiskPredictor::new();
        predictor
            .expect_assess()
            .returning(|_| Err(ApiError::Upstream("Failed to predict patient data".into())));

        let app = test::init_service(
            App::new()
                .app_data(state_with(predictor).await)
                .route("/predict", web::post().to(predict)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(clinical_body())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
