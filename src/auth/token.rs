use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::{Account, Role};

/// Signed token payload. The role is informational; the gate always
/// re-reads the account from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub account_id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 keys derived from the shared server secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, account: &Account) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(account, Utc::now())
    }

    pub fn issue_at(
        &self,
        account: &Account,
        issued_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            account_id: account.id.clone(),
            role: account.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountStatus;
    use jsonwebtoken::errors::ErrorKind;

    fn account(role: Role) -> Account {
        Account {
            id: "acc-1".into(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: String::new(),
            role,
            status: AccountStatus::Active,
            phone_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_carries_identity_and_one_day_expiry() {
        let keys = TokenKeys::new("test-secret", Duration::hours(24));
        let token = keys.issue(&account(Role::Doctor)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.account_id, "acc-1");
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", Duration::hours(24));
        let token = keys
            .issue_at(&account(Role::User), Utc::now() - Duration::hours(25))
            .unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let ours = TokenKeys::new("test-secret", Duration::hours(24));
        let theirs = TokenKeys::new("other-secret", Duration::hours(24));
        let token = theirs.issue(&account(Role::Admin)).unwrap();
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::new("test-secret", Duration::hours(24));
        assert!(keys.verify("not.a.token").is_err());
    }

    #[test]
    fn claims_use_client_field_names() {
        let value = serde_json::to_value(Claims {
            account_id: "a".into(),
            role: Role::Nurse,
            iat: 1,
            exp: 2,
        })
        .unwrap();
        assert_eq!(value["userId"], "a");
        assert_eq!(value["role"], "nurse");
    }
}
