use actix_web::web;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{normalize_email, present};
use crate::auth::password::{hash_password, verify_or_dummy};
use crate::auth::TokenKeys;
use crate::db::{accounts, Database};
use crate::error::{is_unique_violation, ApiError};
use crate::models::{Account, NewAccount, Role};

const FIELDS_REQUIRED: &str = "All fields are required.";
const CREDENTIALS_TOO_SHORT: &str =
    "Username must be at least 3 characters and password at least 6 characters long.";
const EMAIL_TAKEN: &str = "User with this email already exists.";
const LOGIN_FIELDS_REQUIRED: &str = "Email and password are required.";
const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 3))]
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

/// Register a new account with the default `user` role.
#[instrument(skip(db, request), fields(email = ?request.email))]
pub async fn sign_up(db: &Database, request: SignUpRequest) -> Result<Account, ApiError> {
    let (Some(username), Some(email), Some(password)) = (
        present(&request.username),
        present(&request.email),
        present(&request.password),
    ) else {
        return Err(ApiError::validation(FIELDS_REQUIRED));
    };

    request
        .validate()
        .map_err(|_| ApiError::validation(CREDENTIALS_TOO_SHORT))?;

    let email = normalize_email(email);
    if accounts::find_by_email(db.pool(), &email).await?.is_some() {
        warn!("sign up with an email that is already registered");
        return Err(ApiError::conflict(EMAIL_TAKEN));
    }

    let password = password.to_owned();
    let password_hash = web::block(move || hash_password(&password))
        .await?
        .map_err(|err| ApiError::internal("Error creating user.", err))?;

    let account = accounts::insert(
        db.pool(),
        &NewAccount {
            username: username.to_owned(),
            email,
            password_hash,
            role: Role::User,
        },
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            ApiError::conflict(EMAIL_TAKEN)
        } else {
            err.into()
        }
    })?;

    info!(account_id = %account.id, "account registered");
    Ok(account)
}

/// Verify credentials and issue a token. Unknown email and wrong password
/// fail identically.
#[instrument(skip(db, keys, request), fields(email = ?request.email))]
pub async fn login(
    db: &Database,
    keys: &TokenKeys,
    request: LoginRequest,
) -> Result<Session, ApiError> {
    let (Some(email), Some(password)) = (present(&request.email), present(&request.password))
    else {
        return Err(ApiError::validation(LOGIN_FIELDS_REQUIRED));
    };

    let account = accounts::find_by_email(db.pool(), &normalize_email(email)).await?;

    let password = password.to_owned();
    let stored_hash = account.as_ref().map(|account| account.password_hash.clone());
    let valid = web::block(move || verify_or_dummy(&password, stored_hash.as_deref())).await?;

    let account = match account {
        Some(account) if valid => account,
        Some(account) => {
            warn!(account_id = %account.id, "login with wrong password");
            return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }
        None => {
            warn!("login with an unknown email");
            return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }
    };

    let token = keys
        .issue(&account)
        .map_err(|err| ApiError::internal("Server error.", err))?;

    info!(account_id = %account.id, role = %account.role, "login succeeded");
    Ok(Session {
        token,
        role: account.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use chrono::Duration;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret", Duration::hours(24))
    }

    fn sign_up_request(username: &str, email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[actix_web::test]
    async fn sign_up_stores_hashed_password_and_user_role() {
        let db = Database::in_memory().await.unwrap();
        let account = sign_up(&db, sign_up_request("alice", "Alice@X.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(account.email, "alice@x.com");
        assert_eq!(account.role, Role::User);
        assert_ne!(account.password_hash, "secret1");
        assert!(verify_password("secret1", &account.password_hash));
    }

    #[actix_web::test]
    async fn short_username_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let err = sign_up(&db, sign_up_request("al", "al@x.com", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), CREDENTIALS_TOO_SHORT);
    }

    #[actix_web::test]
    async fn duplicate_email_conflicts() {
        let db = Database::in_memory().await.unwrap();
        sign_up(&db, sign_up_request("alice", "alice@x.com", "secret1"))
            .await
            .unwrap();
        let err = sign_up(&db, sign_up_request("alice2", "alice@x.com", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[actix_web::test]
    async fn login_failures_are_indistinguishable() {
        let db = Database::in_memory().await.unwrap();
        sign_up(&db, sign_up_request("alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = login(&db, &keys(), login_request("alice@x.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = login(&db, &keys(), login_request("bob@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::Unauthenticated(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[actix_web::test]
    async fn unknown_email_pays_for_a_hash_verification() {
        let db = Database::in_memory().await.unwrap();
        sign_up(&db, sign_up_request("alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let started = std::time::Instant::now();
        login(&db, &keys(), login_request("alice@x.com", "wrong"))
            .await
            .unwrap_err();
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        login(&db, &keys(), login_request("bob@x.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = started.elapsed();

        // same argon2 work on both paths; an early return is orders of
        // magnitude faster
        assert!(
            unknown_email * 10 >= wrong_password,
            "unknown email {:?} vs wrong password {:?}",
            unknown_email,
            wrong_password
        );
    }

    #[actix_web::test]
    async fn login_issues_token_for_the_account_role() {
        let db = Database::in_memory().await.unwrap();
        let account = sign_up(&db, sign_up_request("alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let session = login(&db, &keys(), login_request("alice@x.com", "secret1"))
            .await
            .unwrap();
        let claims = keys().verify(&session.token).unwrap();

        assert_eq!(session.role, Role::User);
        assert_eq!(claims.account_id, account.id);
    }
}
