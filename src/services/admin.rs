use serde::Deserialize;
use tracing::{info, instrument};

use super::{present, LIST_LIMIT};
use crate::db::{accounts, Database};
use crate::error::ApiError;
use crate::models::{Account, AccountStatus, Role};

const ROLE_REQUIRED: &str = "Role field is required.";
const USER_NOT_FOUND: &str = "User not found.";

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Newest-created first, capped at [`LIST_LIMIT`].
pub async fn list_users(db: &Database) -> Result<Vec<Account>, ApiError> {
    Ok(accounts::list(db.pool(), LIST_LIMIT).await?)
}

#[instrument(skip(db, request))]
pub async fn update_user(
    db: &Database,
    id: &str,
    request: UpdateUserRequest,
) -> Result<Account, ApiError> {
    let role = present(&request.role)
        .ok_or_else(|| ApiError::validation(ROLE_REQUIRED))?
        .parse::<Role>()
        .map_err(|err| ApiError::validation(err.to_string()))?;
    let status = present(&request.status)
        .map(str::parse::<AccountStatus>)
        .transpose()
        .map_err(|err| ApiError::validation(err.to_string()))?;

    let account = accounts::update_access(db.pool(), id, role, status)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    info!(role = %account.role, status = ?account.status, "account access updated");
    Ok(account)
}

#[instrument(skip(db))]
pub async fn delete_user(db: &Database, id: &str) -> Result<(), ApiError> {
    if !accounts::delete(db.pool(), id).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    info!("account deleted");
    Ok(())
}
