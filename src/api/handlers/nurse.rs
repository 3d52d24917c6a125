use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::Account;
use crate::services::patients;

pub async fn list_patients(
    state: web::Data<AppState>,
    caller: web::ReqData<Account>,
) -> Result<HttpResponse, ApiError> {
    let records = patients::list_for_nurse(&state.db, &caller).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Patients fetched successfully.",
        "patients": records,
    })))
}
