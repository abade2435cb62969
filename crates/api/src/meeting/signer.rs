//! Compact HMAC-SHA256 token signing
//!
//! Produces `base64url(header).base64url(payload).base64url(signature)`,
//! which is byte-compatible with an HS256 JWT. Nothing here verifies tokens;
//! callers only produce them, so this can be swapped for a JWT library
//! without touching the services above it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Failed to encode token segment: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Invalid signing key")]
    InvalidKey,
}

/// Token header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Encode a value as unpadded base64url JSON
fn encode_segment<T: Serialize>(value: &T) -> Result<String, SignError> {
    let json = serde_json::to_vec(value)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Sign `header` and `payload` with `secret`
pub fn sign_token<H, P>(header: &H, payload: &P, secret: &[u8]) -> Result<String, SignError>
where
    H: Serialize,
    P: Serialize,
{
    let signing_input = format!("{}.{}", encode_segment(header)?, encode_segment(payload)?);

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignError::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}
