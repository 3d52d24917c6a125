//! Credentials and tokens
//!
//! [`password`] hashes and verifies account passwords with argon2,
//! [`token`] issues and verifies the signed session tokens.

pub mod password;
pub mod token;

pub use token::{Claims, TokenKeys};
