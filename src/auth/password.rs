use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use tracing::warn;

/// Stand-in verified when no account matches, so an unknown email costs
/// the same argon2 work as a wrong password. Parameters match
/// `Argon2::default()`.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Salted argon2id hash in PHC string format.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// A stored hash that fails to parse never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

/// Verify against the stored hash, or against [`DUMMY_HASH`] when there is
/// none. `None` never verifies.
pub fn verify_or_dummy(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            verify_password(password, DUMMY_HASH);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_hashed_password() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("secret1").unwrap(), hash_password("secret1").unwrap());
    }

    #[test]
    fn malformed_hash_does_not_verify() {
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    fn params(hash: &str) -> String {
        let parsed = PasswordHash::new(hash).unwrap();
        format!("{}${}", parsed.algorithm, parsed.params)
    }

    #[test]
    fn dummy_hash_costs_the_same_as_a_real_one() {
        let real = hash_password("secret1").unwrap();
        assert_eq!(params(DUMMY_HASH), params(&real));
    }

    #[test]
    fn missing_hash_never_verifies() {
        assert!(!verify_or_dummy("secret1", None));
        assert!(!verify_or_dummy("", None));
        let real = hash_password("secret1").unwrap();
        assert!(verify_or_dummy("secret1", Some(&real)));
    }
}
