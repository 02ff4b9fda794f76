use josekit::JoseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    #[error("Token encoding failed: {0}")]
    Jose(#[from] JoseError),

    #[error("Token rejected: {0}")]
    Rejected(&'static str),
}
