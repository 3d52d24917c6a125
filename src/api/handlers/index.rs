use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::error;

use crate::api::AppState;

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().body("Hello, welcome to backend")
}

pub async fn welcome() -> HttpResponse {
    HttpResponse::Ok().body("Welcome to My API")
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.db.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(err) => {
            error!(error = %err, "health check failed");
            HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
        }
    }
}
