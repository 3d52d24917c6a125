use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::Account;
use crate::services::patients;

/// The caller's own patient record; `data` is null when none exists yet.
pub async fn own_data(
    state: web::Data<AppState>,
    caller: web::ReqData<Account>,
) -> Result<HttpResponse, ApiError> {
    let body = match patients::own_record(&state.db, &caller).await? {
        Some(record) => json!({
            "message": "User data retrieved successfully",
            "data": record,
        }),
        None => json!({
            "message": "User data not found",
            "data": null,
        }),
    };
    Ok(HttpResponse::Ok().json(body))
}
