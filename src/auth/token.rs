use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by access and refresh tokens.
///
/// `sub` is the session token identifier from the principal's authentication
/// record - the server-side revocation handle. `exp` is absent on tokens
/// configured to never expire.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("unexpected signing algorithm")]
    WrongAlgorithm,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,
}

/// Issues RS256-signed tokens bound to a session token identifier.
///
/// Access and refresh signers are separate instances holding distinct private
/// keys, so compromise of one key cannot forge the other kind.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    lifetime: Option<Duration>,
}

impl TokenSigner {
    /// Build from a base64-encoded PEM private key and a lifetime in minutes.
    /// Zero minutes means issued tokens carry no expiration.
    pub fn from_config(private_key_b64: &str, minutes: u64) -> Result<Self, TokenError> {
        let pem = BASE64
            .decode(private_key_b64.trim())
            .map_err(|e| TokenError::InvalidKey(format!("private key is not valid base64: {}", e)))?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| TokenError::InvalidKey(format!("private key is not RSA PEM: {}", e)))?;
        let lifetime = if minutes == 0 { None } else { Some(Duration::minutes(minutes as i64)) };
        Ok(Self { key, lifetime })
    }

    pub fn issue(&self, session_token_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: session_token_id,
            iat: now.timestamp(),
            exp: self.lifetime.map(|d| (now + d).timestamp()),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

/// Verifies token signature, algorithm and expiry, returning the embedded
/// session token identifier. Whether that identifier still resolves to a
/// principal is the auth middleware's live lookup, not this type's concern.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
}

impl TokenVerifier {
    pub fn from_config(public_key_b64: &str) -> Result<Self, TokenError> {
        let pem = BASE64
            .decode(public_key_b64.trim())
            .map_err(|e| TokenError::InvalidKey(format!("public key is not valid base64: {}", e)))?;
        let key = DecodingKey::from_rsa_pem(&pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key is not RSA PEM: {}", e)))?;
        Ok(Self { key })
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        // Check the header algorithm up front. A token signed with anything
        // but RS256 (e.g. an HS256 forgery keyed on the public key bytes) is
        // rejected before signature verification runs.
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenError::WrongAlgorithm);
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation.set_required_spec_claims(&["sub"]);

        let data = decode::<Claims>(token, &self.key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature
            | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => TokenError::InvalidSignature,
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
            _ => TokenError::Malformed,
        })?;

        Ok(data.claims.sub)
    }
}
