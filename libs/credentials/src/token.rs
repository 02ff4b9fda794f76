use std::fmt;
use std::time::{Duration, SystemTime};

use josekit::{jws::{JwsHeader, HS256}, jwt::{self, JwtPayload}, Value};

use crate::CredentialError;

const USER_ID_CLAIM: &str = "uid";

/// Shortest secret accepted by the HS256 signer.
pub const MIN_SECRET_LEN: usize = 32;

/// Claims recovered from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// The email address of the user, carried as the `sub` claim.
    pub subject: String,
    pub user_id: String,
}

/// Issues and verifies HS256 signed access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>, issuer: impl Into<String>, audience: impl Into<String>, ttl: Duration) -> Self {
        TokenIssuer {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl,
        }
    }

    /// Generates a token for the given user, expiring after the configured ttl.
    ///
    /// # Arguments
    /// * `email`: becomes the `sub` claim.
    /// * `user_id`: stored in the `uid` claim so callers can resolve the user without a lookup.
    pub fn issue(&self, email: &str, user_id: &str) -> Result<String, CredentialError> {
        let now = SystemTime::now();

        let mut header = JwsHeader::new();
        header.set_token_type("JWT");

        let mut payload = JwtPayload::new();
        payload.set_issuer(self.issuer.as_str());
        payload.set_audience(vec![self.audience.as_str()]);
        payload.set_subject(email);
        payload.set_issued_at(&now);
        payload.set_not_before(&now);
        payload.set_expires_at(&(now + self.ttl));
        payload.set_claim(USER_ID_CLAIM, Some(Value::String(user_id.to_string())))?;

        let signer = HS256.signer_from_bytes(&self.secret)?;
        Ok(jwt::encode_with_signer(&payload, &header, &signer)?)
    }

    /// Verifies the signature and the registered claims of a token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, CredentialError> {
        let verifier = HS256.verifier_from_bytes(&self.secret)?;
        let (payload, _) = jwt::decode_with_verifier(token, &verifier)?;
        let now = SystemTime::now();

        match payload.expires_at() {
            Some(expires_at) if expires_at > now => {}
            _ => return Err(CredentialError::Rejected("token has expired")),
        }

        if payload.issuer() != Some(self.issuer.as_str()) {
            return Err(CredentialError::Rejected("invalid issuer"));
        }

        let audience_ok = payload.audience()
            .map(|audience| audience.contains(&self.audience.as_str()))
            .unwrap_or(false);
        if !audience_ok {
            return Err(CredentialError::Rejected("invalid audience"));
        }

        if payload.issued_at().is_none_or(|issued_at| issued_at > now) {
            return Err(CredentialError::Rejected("invalid issued at time"));
        }

        if payload.not_before().is_none_or(|not_before| not_before > now) {
            return Err(CredentialError::Rejected("invalid not before time"));
        }

        let subject = payload.subject()
            .ok_or(CredentialError::Rejected("missing subject"))?
            .to_string();

        let user_id = payload.claim(USER_ID_CLAIM)
            .and_then(Value::as_str)
            .ok_or(CredentialError::Rejected("missing user id"))?
            .to_string();

        Ok(TokenClaims { subject, user_id })
    }
}
