use std::time::{SystemTime, UNIX_EPOCH};

use base64::{prelude::BASE64_URL_SAFE_NO_PAD, Engine};
use ring::hmac;
use serde::{Deserialize, Serialize};

/// The only signing algorithm accepted on inbound bearer tokens.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is not three dot-separated segments")]
    Malformed,
    #[error("token segment is not valid base64url")]
    Encoding,
    #[error("token header or claims are not valid JSON")]
    Json,
    #[error("unsupported signing algorithm {0:?}")]
    Algorithm(String),
    #[error("signature verification failed")]
    Signature,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Claims carried by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            iat: None,
            exp: None,
        }
    }
}

/// HMAC-SHA256 key shared with whoever mints tokens.
pub struct Secret(hmac::Key);

impl Secret {
    pub fn new(bytes: &[u8]) -> Self {
        Self(hmac::Key::new(hmac::HMAC_SHA256, bytes))
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Signs `claims` as a compact HS256 JWT.
pub fn issue(secret: &Secret, claims: &Claims) -> Result<String, TokenError> {
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: Some("JWT".to_string()),
    };

    let header = serde_json::to_vec(&header).map_err(|_| TokenError::Json)?;
    let claims = serde_json::to_vec(claims).map_err(|_| TokenError::Json)?;

    let signing_input = format!(
        "{}.{}",
        BASE64_URL_SAFE_NO_PAD.encode(header),
        BASE64_URL_SAFE_NO_PAD.encode(claims)
    );
    let tag = hmac::sign(&secret.0, signing_input.as_bytes());

    Ok(format!(
        "{signing_input}.{}",
        BASE64_URL_SAFE_NO_PAD.encode(tag.as_ref())
    ))
}

/// Verifies a compact HS256 JWT and returns its claims.
pub fn verify(secret: &Secret, token: &str) -> Result<Claims, TokenError> {
    verify_at(secret, token, now())
}

pub fn verify_at(secret: &Secret, token: &str, now: u64) -> Result<Claims, TokenError> {
    let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
    let (header, claims) = signing_input
        .split_once('.')
        .ok_or(TokenError::Malformed)?;
    if claims.contains('.') {
        return Err(TokenError::Malformed);
    }

    let header: Header = decode_json(header)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::Algorithm(header.alg));
    }

    let signature = BASE64_URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Encoding)?;

    hmac::verify(&secret.0, signing_input.as_bytes(), &signature)
        .map_err(|_| TokenError::Signature)?;

    let claims: Claims = decode_json(claims)?;
    if let Some(exp) = claims.exp {
        if exp <= now {
            return Err(TokenError::Expired);
        }
    }

    Ok(claims)
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Encoding)?;

    serde_json::from_slice(&bytes).map_err(|_| TokenError::Json)
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
