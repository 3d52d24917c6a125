use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::AppState;
use crate::error::ApiError;
use crate::services::admin::{self, UpdateUserRequest};

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = admin::list_users(&state.db).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}

pub async fn update_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = admin::update_user(&state.db, &id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User updated successfully.",
        "user": user,
    })))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    admin::delete_user(&state.db, &id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User deleted successfully.",
    })))
}
