use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::AppState;
use crate::error::ApiError;
use crate::services::auth::{self, LoginRequest, SignUpRequest};

pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ApiError> {
    auth::sign_up(&state.db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User registered successfully.",
    })))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = auth::login(&state.db, &state.tokens, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "token": session.token,
        "role": session.role,
    })))
}
