//! Password hashing and public token generation.
//!
//! Uses Argon2id for password hashing.

use crate::error::AuthError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Length in hex characters of a public profile token (32 random bytes).
pub const PUBLIC_TOKEN_LEN: usize = 64;

/// Hash a password using Argon2id.
///
/// Returns the PHC-formatted hash string suitable for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate the unguessable token embedded in a profile's QR code.
///
/// Returns 32 random bytes as lowercase hex.
pub fn generate_public_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; PUBLIC_TOKEN_LEN / 2];
    getrandom::fill(&mut bytes).map_err(|e| AuthError::Rng(e.to_string()))?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "correct horse battery";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_verify_invalid_hash_format() {
        assert!(!verify_password("password", "not-a-valid-hash"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn test_public_token_shape() {
        let a = generate_public_token().unwrap();
        let b = generate_public_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), PUBLIC_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
