use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::notification::{Principal, Role};
use crate::domain::ports::TokenVerifier;

type HmacSha256 = Hmac<Sha256>;

/// Verifies bearer tokens of the form `<user_id>.<role>.<expires_unix>.<sig>`
/// where `sig` is the hex HMAC-SHA256 of the first three segments.
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Mint a token for `principal` valid for `ttl`.
    pub fn issue(&self, principal: &Principal, ttl: Duration) -> String {
        let expires = (Utc::now() + ttl).timestamp();
        let claims = format!("{}.{}.{}", principal.user_id, principal.role, expires);
        let signature = hex::encode(self.sign(&claims).finalize().into_bytes());
        format!("{claims}.{signature}")
    }

    fn sign(&self, claims: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(claims.as_bytes());
        mac
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Result<Principal, DomainError> {
        let malformed = || DomainError::Unauthenticated("malformed token".to_string());

        let (claims, signature) = token.rsplit_once('.').ok_or_else(malformed)?;
        let signature = hex::decode(signature).map_err(|_| malformed())?;
        self.sign(claims)
            .verify_slice(&signature)
            .map_err(|_| DomainError::Unauthenticated("invalid token signature".to_string()))?;

        let mut parts = claims.split('.');
        let (Some(user_id), Some(role), Some(expires), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let user_id = Uuid::parse_str(user_id).map_err(|_| malformed())?;
        let role: Role = role.parse().map_err(|_| malformed())?;
        let expires: i64 = expires.parse().map_err(|_| malformed())?;
        if expires <= Utc::now().timestamp() {
            return Err(DomainError::Unauthenticated("token expired".to_string()));
        }

        Ok(Principal::new(user_id, role))
    }
}
