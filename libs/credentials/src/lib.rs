mod error;
mod password;
mod token;

pub use error::CredentialError;
pub use password::{hash_password, verify_password, HashParams};
pub use token::{TokenClaims, TokenIssuer, MIN_SECRET_LEN};
