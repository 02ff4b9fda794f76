use scrypt::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
    Scrypt,
};

use crate::CredentialError;

pub use scrypt::Params as HashParams;

/// Hashes a password with scrypt and a fresh random salt.
///
/// The result is a PHC string, so the cost parameters travel with the hash and
/// verification does not need to know which `params` were used.
///
/// Use release builds when hashing with the recommended parameters, debug builds are VERY slow.
pub fn hash_password(password: &str, params: HashParams) -> Result<String, CredentialError> {
    let salt = SaltString::generate(OsRng);
    let password_hash = Scrypt
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map_err(|err| CredentialError::Hash(err.to_string()))?;

    Ok(password_hash.to_string())
}

/// Checks if the provided password matches the hashed password.
///
/// # Returns
/// * `Ok(true)` if the password matches the hash.
/// * `Ok(false)` if the password does not match the hash.
/// * `Err(CredentialError::MalformedHash)` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|err| {
        tracing::debug!("Stored hash could not be parsed: {}", err);
        CredentialError::MalformedHash(err.to_string())
    })?;

    match Scrypt.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(err) => {
            tracing::warn!("Password verification failed: {}", err);
            Err(CredentialError::Hash(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params() -> HashParams {
        HashParams::new(8, 8, 1, 32).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse", cheap_params()).unwrap();

        assert!(hash.starts_with("$scrypt$"));
        assert!(verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("correct horse", cheap_params()).unwrap();

        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let first = hash_password("correct horse", cheap_params()).unwrap();
        let second = hash_password("correct horse", cheap_params()).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_is_an_error() {
        let result = verify_password("correct horse", "not-a-phc-string");

        assert!(matches!(result, Err(CredentialError::MalformedHash(_))));
    }
}
